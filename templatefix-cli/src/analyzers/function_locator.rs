use regex::Regex;

use crate::core::{FunctionSpan, MigrateError};

/// Finds template functions in a source buffer using lexical cues only.
///
/// A function is recognised by its `export function <name>(<param>...)`
/// header; the anchor is the first `const { ... } = <param>;` statement
/// after it that still lies inside the function body.
pub struct FunctionLocator;

impl FunctionLocator {
    /// Locate `function_name` in `buffer`.
    ///
    /// Only the first header carrying the name is considered.
    pub fn locate(buffer: &str, function_name: &str) -> Result<FunctionSpan, MigrateError> {
        let header = Regex::new(&format!(
            r"export\s+function\s+{}\s*\(\s*([A-Za-z_$][\w$]*)\s*(?::[^,)]*)?\)",
            regex::escape(function_name)
        ))?;

        let caps = header
            .captures(buffer)
            .ok_or_else(|| MigrateError::FunctionNotFound(function_name.to_string()))?;
        let whole = caps.get_match();
        let param = caps[1].to_string();

        let body_open = buffer[whole.end()..]
            .find('{')
            .map(|offset| whole.end() + offset)
            .ok_or_else(|| MigrateError::AnchorNotFound(function_name.to_string()))?;
        let body_end = Self::body_end(buffer, body_open);

        let anchor = Regex::new(&format!(
            r"const\s*\{{[^}}]*\}}\s*=\s*{}\s*;",
            regex::escape(&param)
        ))?;
        let statement = anchor
            .find(&buffer[body_open..body_end])
            .ok_or_else(|| MigrateError::AnchorNotFound(function_name.to_string()))?;
        let anchor_start = body_open + statement.start();
        let anchor_end = body_open + statement.end();

        // The list has no closing brace of its own, so the first `}` ends it
        let text = statement.as_str();
        let open = text.find('{').unwrap_or(0) + 1;
        let close = text.find('}').unwrap_or(text.len());

        Ok(FunctionSpan {
            start: whole.start(),
            end: anchor_end,
            anchor: anchor_start..anchor_end,
            bindings: anchor_start + open..anchor_start + close,
            body_end,
            param,
        })
    }

    /// End of the function whose body opens at `body_open`.
    ///
    /// Stops at the first column-zero `}` line (inclusive) or the next
    /// column-zero `export` line (exclusive), whichever comes first.
    fn body_end(buffer: &str, body_open: usize) -> usize {
        let mut pos = match buffer[body_open..].find('\n') {
            Some(offset) => body_open + offset + 1,
            None => return buffer.len(),
        };

        while pos < buffer.len() {
            let line_end = buffer[pos..]
                .find('\n')
                .map(|offset| pos + offset)
                .unwrap_or(buffer.len());
            let line = &buffer[pos..line_end];

            if matches!(line.trim_end(), "}" | "};") {
                return pos + line.trim_end().len();
            }
            if line.starts_with("export ") {
                return pos;
            }

            pos = line_end + 1;
        }

        buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "import { getPexelsImage } from '../utils';

export function generateCafeModernLayout(data: GeneratedPageData): string {
  const { title, pics } = data;
  return `<h1>${title}</h1>`;
}

export function generateCafeMinimalLayout(data: any): string {
  const { title, tagline, pics } = data;
  return `<h2>${tagline}</h2>`;
}
";

    #[test]
    fn test_locate_first_function() {
        let span = FunctionLocator::locate(SOURCE, "generateCafeModernLayout").unwrap();

        assert!(SOURCE[span.start..].starts_with("export function generateCafeModernLayout"));
        assert_eq!(&SOURCE[span.anchor.clone()], "const { title, pics } = data;");
        assert_eq!(&SOURCE[span.bindings.clone()], " title, pics ");
        assert_eq!(span.end, span.anchor.end);
        assert_eq!(span.param, "data");
        assert!(SOURCE[..span.body_end].ends_with("</h1>`;\n}"));
    }

    #[test]
    fn test_locate_untyped_parameter() {
        let span = FunctionLocator::locate(SOURCE, "generateCafeMinimalLayout").unwrap();

        assert_eq!(&SOURCE[span.bindings.clone()], " title, tagline, pics ");
        assert!(SOURCE[span.body()].ends_with("</h2>`;\n}"));
    }

    #[test]
    fn test_name_prefix_does_not_match() {
        let err = FunctionLocator::locate(SOURCE, "generateCafe").unwrap_err();
        assert!(matches!(err, MigrateError::FunctionNotFound(_)));
    }

    #[test]
    fn test_missing_function() {
        let err = FunctionLocator::locate(SOURCE, "generateGymBoldLayout").unwrap_err();
        assert!(matches!(err, MigrateError::FunctionNotFound(ref name) if name == "generateGymBoldLayout"));
    }

    #[test]
    fn test_anchor_is_not_borrowed_from_next_function() {
        let source = "export function generateA(data: GeneratedPageData): string {
  return `<p>no destructuring here</p>`;
}

export function generateB(data: GeneratedPageData): string {
  const { pics } = data;
  return ``;
}
";
        let err = FunctionLocator::locate(source, "generateA").unwrap_err();
        assert!(matches!(err, MigrateError::AnchorNotFound(_)));
    }

    #[test]
    fn test_anchor_must_destructure_the_parameter() {
        let source = "export function generateA(page: GeneratedPageData): string {
  const { pics } = data;
  return ``;
}
";
        let err = FunctionLocator::locate(source, "generateA").unwrap_err();
        assert!(matches!(err, MigrateError::AnchorNotFound(_)));
    }

    #[test]
    fn test_multiple_parameters_are_not_recognised() {
        let source = "export function generateA(data: GeneratedPageData, extra: string): string {
  const { pics } = data;
}
";
        let err = FunctionLocator::locate(source, "generateA").unwrap_err();
        assert!(matches!(err, MigrateError::FunctionNotFound(_)));
    }

    #[test]
    fn test_body_without_closing_brace_stops_at_next_export() {
        let source = "export function generateA(data: any): string {
  const { pics } = data;
  return ``; }
export function generateB(data: any): string {
  const { pics } = data;
}
";
        let span = FunctionLocator::locate(source, "generateA").unwrap();
        assert!(source[span.body_end..].starts_with("export function generateB"));
    }

    #[test]
    fn test_body_runs_to_end_of_file() {
        let source = "export function generateA(data: any): string {\n  const { pics } = data;\n  return ``;";
        let span = FunctionLocator::locate(source, "generateA").unwrap();
        assert_eq!(span.body_end, source.len());
    }
}
