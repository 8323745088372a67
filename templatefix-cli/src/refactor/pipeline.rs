use crate::analyzers::BindingList;
use crate::config::TemplateNames;
use crate::core::{FunctionOutcome, FunctionSpan, MigrateError};

use super::rules::{
    AltTextSubstitution, BindingAugmentation, CallSiteNormalization, CaptionSubstitution,
    DescriptionsAlias, FallbackInjection, FetchElision, RuleContext, TransformRule,
};

/// Buffer produced by running the pipeline over one function
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub text: String,
    pub outcome: FunctionOutcome,
}

impl PipelineOutput {
    pub fn changed(&self) -> bool {
        self.outcome.changed()
    }
}

/// The ordered rewrite rules for migrating one template function.
///
/// Order matters: the binding added by augmentation is what the alias
/// declaration reads, and the callback index chosen by call-site
/// normalization is what the fallback, caption and alt-text rules emit.
pub struct RulePipeline {
    names: TemplateNames,
    rules: Vec<Box<dyn TransformRule>>,
}

impl RulePipeline {
    pub fn new(names: TemplateNames) -> Result<Self, MigrateError> {
        let rules: Vec<Box<dyn TransformRule>> = vec![
            Box::new(BindingAugmentation),
            Box::new(DescriptionsAlias),
            Box::new(CallSiteNormalization::new(&names)?),
            Box::new(FetchElision::new(&names)?),
            Box::new(FallbackInjection::new()?),
            Box::new(CaptionSubstitution::new()?),
            Box::new(AltTextSubstitution::new()?),
        ];

        Ok(Self { names, rules })
    }

    /// Migrate the function at `span`, returning the whole updated buffer.
    ///
    /// Text outside `span.body()` is copied through untouched.
    pub fn transform(
        &self,
        buffer: &str,
        span: &FunctionSpan,
        function_name: &str,
    ) -> Result<PipelineOutput, MigrateError> {
        let bindings = BindingList::parse(&buffer[span.bindings.clone()]);

        if bindings.contains(&self.names.descriptions_field) {
            tracing::info!(
                "{} already has {}",
                function_name,
                self.names.descriptions_field
            );
            return Ok(PipelineOutput {
                text: buffer.to_string(),
                outcome: FunctionOutcome::AlreadyMigrated,
            });
        }

        let image_local = match bindings.get(&self.names.image_field) {
            Some(binding) => binding.local.clone(),
            None => {
                let reason = format!(
                    "anchor does not bind `{}`",
                    self.names.image_field
                );
                tracing::warn!("Skipping {}: {}", function_name, reason);
                return Ok(PipelineOutput {
                    text: buffer.to_string(),
                    outcome: FunctionOutcome::Skipped { reason },
                });
            }
        };

        let body = span.body();
        let mut ctx = RuleContext::new(
            function_name,
            &self.names,
            image_local,
            span.bindings.start - body.start..span.bindings.end - body.start,
            span.anchor.end - body.start,
        )?;

        let mut text = buffer[body.clone()].to_string();
        let mut applied = Vec::new();
        for rule in &self.rules {
            if let Some(updated) = rule.apply(&text, &mut ctx) {
                tracing::debug!("{}: applied {}", ctx.function_name, rule.id().label());
                applied.push(rule.id());
                text = updated;
            }
        }

        if applied.is_empty() {
            return Ok(PipelineOutput {
                text: buffer.to_string(),
                outcome: FunctionOutcome::Unchanged,
            });
        }

        let mut spliced = String::with_capacity(buffer.len() + text.len() - body.len());
        spliced.push_str(&buffer[..body.start]);
        spliced.push_str(&text);
        spliced.push_str(&buffer[body.end..]);

        tracing::info!("Fixed {}", function_name);
        Ok(PipelineOutput {
            text: spliced,
            outcome: FunctionOutcome::Migrated { rules: applied },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::FunctionLocator;
    use crate::core::RuleId;
    use pretty_assertions::assert_eq;

    const UNMIGRATED: &str = r#"export function generateGymBoldLayout(data: GeneratedPageData): string {
  const { title, pics, theme_color } = data;

  return `
    <h1>${title}</h1>
    <div class="gallery">
      ${pics.map((query, i) => `
        <figure>
          <img src="${getPexelsImage(query, 900, 900)}" alt="${query}" loading="lazy">
          <h3>${query.toUpperCase()}</h3>
          <p>Train with ${query}</p>
        </figure>
      `).join('')}
    </div>
  `;
}
"#;

    const MIGRATED: &str = r#"export function generateGymBoldLayout(data: GeneratedPageData): string {
  const { title, pics, picDescriptions, theme_color } = data;
  const descriptions = picDescriptions || pics.map((_, i) => `Item ${i + 1}`);

  return `
    <h1>${title}</h1>
    <div class="gallery">
      ${pics.map((url, i) => `
        <figure>
          <img src="${url}" alt="${descriptions[i]}" loading="lazy" onerror="this.src='https://picsum.photos/900/900?random=${i}'">
          <h3>${descriptions[i].toUpperCase()}</h3>
          <p>Train with ${descriptions[i]}</p>
        </figure>
      `).join('')}
    </div>
  `;
}
"#;

    fn migrate(source: &str) -> PipelineOutput {
        let pipeline = RulePipeline::new(TemplateNames::default()).unwrap();
        let span = FunctionLocator::locate(source, "generateGymBoldLayout").unwrap();
        pipeline.transform(source, &span, "generateGymBoldLayout").unwrap()
    }

    #[test]
    fn test_full_migration() {
        let output = migrate(UNMIGRATED);

        assert_eq!(output.text, MIGRATED);
        assert_eq!(
            output.outcome,
            FunctionOutcome::Migrated {
                rules: vec![
                    RuleId::BindingAugmentation,
                    RuleId::DescriptionsAlias,
                    RuleId::CallSiteNormalization,
                    RuleId::FetchElision,
                    RuleId::FallbackInjection,
                    RuleId::CaptionSubstitution,
                    RuleId::AltTextSubstitution,
                ]
            }
        );
    }

    #[test]
    fn test_migrated_function_is_left_alone() {
        let output = migrate(MIGRATED);

        assert_eq!(output.outcome, FunctionOutcome::AlreadyMigrated);
        assert!(!output.changed());
        assert_eq!(output.text, MIGRATED);
    }

    #[test]
    fn test_rules_are_idempotent_without_guard() {
        // Alias present but the binding was hand-removed: only the binding comes back
        let edited = MIGRATED.replace("pics, picDescriptions,", "pics,");
        let output = migrate(&edited);

        assert_eq!(
            output.outcome,
            FunctionOutcome::Migrated {
                rules: vec![RuleId::BindingAugmentation]
            }
        );
        assert_eq!(output.text, MIGRATED);
    }

    #[test]
    fn test_missing_image_binding_is_skipped() {
        let source = UNMIGRATED.replace("title, pics, theme_color", "title, theme_color");
        let output = migrate(&source);

        assert!(matches!(output.outcome, FunctionOutcome::Skipped { .. }));
        assert_eq!(output.text, source);
    }

    #[test]
    fn test_surrounding_text_is_untouched() {
        let source = format!(
            "const header = `<h1>${{query}}</h1>`;\n\n{}\nexport const footer = `<p>${{query}}</p>`;\n",
            UNMIGRATED
        );
        let output = migrate(&source);

        assert!(output.text.starts_with("const header = `<h1>${query}</h1>`;\n\n"));
        assert!(output.text.ends_with("\nexport const footer = `<p>${query}</p>`;\n"));
        assert!(output.text.contains(MIGRATED));
    }
}
