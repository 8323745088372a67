use regex::{Captures, Regex};
use std::ops::Range;

use crate::analyzers::bindings::{self, BindingList};
use crate::config::TemplateNames;
use crate::core::{MigrateError, RuleId};

const IDENT: &str = r"[A-Za-z_$][\w$]*";

/// State shared by the rules of one pipeline run over one function.
///
/// Offsets are relative to the function text the rules operate on.
pub struct RuleContext<'a> {
    pub function_name: &'a str,
    pub names: &'a TemplateNames,

    /// Local the image list is bound to
    pub image_local: String,

    /// Text between the anchor's braces
    pub bindings: Range<usize>,

    /// End of the anchor statement
    pub anchor_end: usize,

    callback: Regex,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        function_name: &'a str,
        names: &'a TemplateNames,
        image_local: String,
        bindings: Range<usize>,
        anchor_end: usize,
    ) -> Result<Self, MigrateError> {
        let callback = Regex::new(&format!(
            r"{}\.map(\(\s*\(\s*{}\s*,\s*({})\s*\))",
            regex::escape(&image_local),
            regex::escape(&names.url_var),
            IDENT
        ))?;

        Ok(Self {
            function_name,
            names,
            image_local,
            bindings,
            anchor_end,
            callback,
        })
    }

    /// Index variable of the innermost normalized image callback enclosing `pos`.
    ///
    /// `None` outside every such callback, where no index is in scope.
    pub fn index_at(&self, text: &str, pos: usize) -> Option<String> {
        self.callback
            .captures_iter(&text[..pos])
            .filter(|caps| {
                let open = caps.get(1).map_or(pos, |m| m.start());
                pos < callback_end(text, open)
            })
            .last()
            .map(|caps| caps[2].to_string())
    }

    fn shift(&mut self, delta: usize) {
        self.bindings.end += delta;
        self.anchor_end += delta;
    }
}

/// One idempotent rewrite step.
pub trait TransformRule {
    fn id(&self) -> RuleId;

    /// Rewrite `text`, returning `None` when nothing matched.
    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Option<String>;
}

fn changed(original: &str, updated: String) -> Option<String> {
    if updated == original {
        None
    } else {
        Some(updated)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Open {
    Delimiter,
    Template,
    Interpolation,
}

/// End (exclusive) of the call whose argument list opens at `open`.
///
/// Template literals, their `${...}` interpolations and quoted strings are
/// skipped over, so parentheses inside markup text do not count.
fn callback_end(text: &str, open: usize) -> usize {
    let bytes = text.as_bytes();
    let mut stack = vec![Open::Delimiter];
    let mut pos = open + 1;

    while pos < bytes.len() {
        let byte = bytes[pos];

        if stack.last() == Some(&Open::Template) {
            match byte {
                b'\\' => pos += 1,
                b'`' => {
                    stack.pop();
                }
                b'$' if bytes.get(pos + 1) == Some(&b'{') => {
                    stack.push(Open::Interpolation);
                    pos += 1;
                }
                _ => {}
            }
        } else {
            match byte {
                b'`' => stack.push(Open::Template),
                b'(' | b'[' | b'{' => stack.push(Open::Delimiter),
                b')' | b']' | b'}' => {
                    stack.pop();
                    if stack.is_empty() {
                        return pos + 1;
                    }
                }
                b'\'' | b'"' => {
                    pos += 1;
                    while pos < bytes.len() && bytes[pos] != byte {
                        if bytes[pos] == b'\\' {
                            pos += 1;
                        }
                        pos += 1;
                    }
                }
                _ => {}
            }
        }

        pos += 1;
    }

    text.len()
}

/// Adds the descriptions field right after the image-list field.
pub struct BindingAugmentation;

impl TransformRule for BindingAugmentation {
    fn id(&self) -> RuleId {
        RuleId::BindingAugmentation
    }

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Option<String> {
        let list = &text[ctx.bindings.clone()];
        let updated = bindings::insert_after(
            list,
            &ctx.names.image_field,
            &ctx.names.descriptions_field,
        )?;

        let delta = updated.len() - list.len();
        let mut result = String::with_capacity(text.len() + delta);
        result.push_str(&text[..ctx.bindings.start]);
        result.push_str(&updated);
        result.push_str(&text[ctx.bindings.end..]);

        ctx.shift(delta);
        Some(result)
    }
}

/// Declares the descriptions alias on the line after the anchor.
pub struct DescriptionsAlias;

impl DescriptionsAlias {
    /// How many lines after the anchor are checked for an existing declaration
    const LOOKAHEAD_LINES: usize = 3;
}

impl TransformRule for DescriptionsAlias {
    fn id(&self) -> RuleId {
        RuleId::DescriptionsAlias
    }

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Option<String> {
        let names = ctx.names;
        let line_end = text[ctx.anchor_end..]
            .find('\n')
            .map(|offset| ctx.anchor_end + offset)
            .unwrap_or(text.len());

        let declaration = format!("const {} =", names.descriptions_alias);
        let already_declared = text[line_end..]
            .lines()
            .skip(1)
            .take(Self::LOOKAHEAD_LINES)
            .any(|line| line.contains(&declaration));
        if already_declared {
            return None;
        }

        let line_start = text[..ctx.anchor_end].rfind('\n').map(|n| n + 1).unwrap_or(0);
        let indent: String = text[line_start..]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();

        let list = BindingList::parse(&text[ctx.bindings.clone()]);
        let descriptions_local = list
            .get(&names.descriptions_field)
            .map(|binding| binding.local.clone())
            .unwrap_or_else(|| names.descriptions_field.clone());

        let label = if names.label_prefix.is_empty() {
            String::new()
        } else {
            format!("{} ", names.label_prefix)
        };

        // Keep CRLF files CRLF
        let (insert_at, newline) = match text[..line_end].strip_suffix('\r') {
            Some(before) => (before.len(), "\r\n"),
            None => (line_end, "\n"),
        };
        let line = format!(
            "{}{}{} {} || {}.map((_, i) => `{}${{i + 1}}`);",
            newline, indent, declaration, descriptions_local, ctx.image_local, label
        );

        let mut result = String::with_capacity(text.len() + line.len());
        result.push_str(&text[..insert_at]);
        result.push_str(&line);
        result.push_str(&text[insert_at..]);
        Some(result)
    }
}

/// Rebinds `pics.map(query => ...)` callbacks as `pics.map((url, i) => ...)`.
pub struct CallSiteNormalization {
    pattern: Regex,
}

impl CallSiteNormalization {
    pub fn new(names: &TemplateNames) -> Result<Self, MigrateError> {
        let query = regex::escape(&names.placeholder_var);
        let pattern = Regex::new(&format!(
            r"({ident})\.map\(\s*(?:\(\s*{query}\s*(?:,\s*({ident})\s*)?\)|{query})\s*=>",
            ident = IDENT,
            query = query
        ))?;
        Ok(Self { pattern })
    }
}

impl TransformRule for CallSiteNormalization {
    fn id(&self) -> RuleId {
        RuleId::CallSiteNormalization
    }

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Option<String> {
        let updated = self
            .pattern
            .replace_all(text, |caps: &Captures| {
                if caps[1] != *ctx.image_local {
                    return caps[0].to_string();
                }
                let index = caps
                    .get(2)
                    .map(|m| m.as_str())
                    .unwrap_or(ctx.names.index_var.as_str());
                format!("{}.map(({}, {}) =>", ctx.image_local, ctx.names.url_var, index)
            })
            .into_owned();

        changed(text, updated)
    }
}

/// Replaces `${getPexelsImage(query, W, H)}` with `${url}`.
pub struct FetchElision {
    pattern: Regex,
}

impl FetchElision {
    pub fn new(names: &TemplateNames) -> Result<Self, MigrateError> {
        let pattern = Regex::new(&format!(
            r"\$\{{\s*{}\(\s*{}\s*,\s*\d+\s*,\s*\d+\s*\)\s*\}}",
            regex::escape(&names.fetch_fn),
            regex::escape(&names.placeholder_var)
        ))?;
        Ok(Self { pattern })
    }
}

impl TransformRule for FetchElision {
    fn id(&self) -> RuleId {
        RuleId::FetchElision
    }

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Option<String> {
        let direct = format!("${{{}}}", ctx.names.url_var);
        let updated = self
            .pattern
            .replace_all(text, regex::NoExpand(direct.as_str()))
            .into_owned();
        changed(text, updated)
    }
}

/// Gives lazy `<img src="${url}">` tags an `onerror` placeholder image.
pub struct FallbackInjection {
    img_tag: Regex,
}

impl FallbackInjection {
    const LAZY: &'static str = r#"loading="lazy""#;

    pub fn new() -> Result<Self, MigrateError> {
        Ok(Self {
            img_tag: Regex::new(r"<img\b[^>]*>")?,
        })
    }
}

impl TransformRule for FallbackInjection {
    fn id(&self) -> RuleId {
        RuleId::FallbackInjection
    }

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Option<String> {
        let ctx = &*ctx;
        let src = format!(r#"src="${{{}}}""#, ctx.names.url_var);

        let updated = self
            .img_tag
            .replace_all(text, |caps: &Captures| {
                let tag = &caps[0];
                let lazy_at = match tag.find(Self::LAZY) {
                    Some(pos) if tag.contains(&src) && !tag.contains("onerror") => pos,
                    _ => return tag.to_string(),
                };
                let Some(index) = ctx.index_at(text, caps.get_match().start()) else {
                    return tag.to_string();
                };

                let split = lazy_at + Self::LAZY.len();
                format!(
                    "{} onerror=\"this.src='{}${{{}}}'\"{}",
                    &tag[..split],
                    ctx.names.fallback_base,
                    index,
                    &tag[split..]
                )
            })
            .into_owned();

        changed(text, updated)
    }
}

/// Points heading and paragraph text at the descriptions alias.
///
/// Only text between tags is rewritten, so attribute values inside the
/// element (an image address in particular) are never touched.
pub struct CaptionSubstitution {
    heading: Regex,
    paragraph: Regex,
    tag: Regex,
}

impl CaptionSubstitution {
    pub fn new() -> Result<Self, MigrateError> {
        Ok(Self {
            heading: Regex::new(r"(?s)<h[1-6](?:\s[^>]*)?>.*?</h[1-6]\s*>")?,
            paragraph: Regex::new(r"(?s)<p(?:\s[^>]*)?>.*?</p\s*>")?,
            tag: Regex::new(r"<[A-Za-z/!][^>]*>")?,
        })
    }

    fn rewrite_elements(&self, element: &Regex, text: &str, ctx: &RuleContext<'_>) -> String {
        let names = ctx.names;
        let upper = format!("${{{}.toUpperCase()}}", names.placeholder_var);
        let plain = format!("${{{}}}", names.placeholder_var);

        element
            .replace_all(text, |caps: &Captures| {
                let Some(index) = ctx.index_at(text, caps.get_match().start()) else {
                    return caps[0].to_string();
                };
                let entry = format!("{}[{}]", names.descriptions_alias, index);
                self.replace_in_text(&caps[0], |run| {
                    run.replace(&upper, &format!("${{{}.toUpperCase()}}", entry))
                        .replace(&plain, &format!("${{{}}}", entry))
                })
            })
            .into_owned()
    }

    /// Apply `rewrite` to the text runs between tags of `fragment`
    fn replace_in_text(&self, fragment: &str, rewrite: impl Fn(&str) -> String) -> String {
        let mut output = String::with_capacity(fragment.len());
        let mut last = 0;

        for tag in self.tag.find_iter(fragment) {
            output.push_str(&rewrite(&fragment[last..tag.start()]));
            output.push_str(tag.as_str());
            last = tag.end();
        }
        output.push_str(&rewrite(&fragment[last..]));

        output
    }
}

impl TransformRule for CaptionSubstitution {
    fn id(&self) -> RuleId {
        RuleId::CaptionSubstitution
    }

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Option<String> {
        let headings = self.rewrite_elements(&self.heading, text, ctx);
        let updated = self.rewrite_elements(&self.paragraph, &headings, ctx);
        changed(text, updated)
    }
}

/// Rewrites `alt="${query}"` on image tags to the matching description.
pub struct AltTextSubstitution {
    img_tag: Regex,
}

impl AltTextSubstitution {
    pub fn new() -> Result<Self, MigrateError> {
        Ok(Self {
            img_tag: Regex::new(r"<img\b[^>]*>")?,
        })
    }
}

impl TransformRule for AltTextSubstitution {
    fn id(&self) -> RuleId {
        RuleId::AltTextSubstitution
    }

    fn apply(&self, text: &str, ctx: &mut RuleContext<'_>) -> Option<String> {
        let ctx = &*ctx;
        let placeholder = format!(r#"alt="${{{}}}""#, ctx.names.placeholder_var);

        let updated = self
            .img_tag
            .replace_all(text, |caps: &Captures| {
                let tag = &caps[0];
                if !tag.contains(&placeholder) {
                    return tag.to_string();
                }
                let Some(index) = ctx.index_at(text, caps.get_match().start()) else {
                    return tag.to_string();
                };
                tag.replace(
                    &placeholder,
                    &format!(r#"alt="${{{}[{}]}}""#, ctx.names.descriptions_alias, index),
                )
            })
            .into_owned();

        changed(text, updated)
    }
}
