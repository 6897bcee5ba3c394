//! The run loop: composes a directive stream into a host document.

use crate::config::RunConfig;
use crate::directive::Directive;
use crate::error::PipelineError;
use crate::progress::ProgressReporter;
use crate::template::Template;
use galley_host::MemoryDocument;
use galley_layout::{Composer, FlowStatus, LayoutError};
use galley_resource::FilesystemAssetResolver;
use galley_traits::{AssetResolver, BreakKind, DocumentHost, NoteKind};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub processed: usize,
    /// Directives whose content unit failed and was left out.
    pub skipped: usize,
    pub floats: usize,
    pub tables: usize,
    pub notes: usize,
    pub pages: usize,
    /// Outcome of the closing overflow flush; `None` when it stalled or failed.
    pub final_flow: Option<FlowStatus>,
}

pub struct RunOutcome<H> {
    pub host: H,
    pub report: RunReport,
}

/// Configures and runs a composition.
#[derive(Default)]
pub struct DocumentBuilder {
    config: RunConfig,
    template: Template,
    assets: Option<Arc<dyn AssetResolver>>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    /// Loads the template at `path`; fails when the file does not exist.
    pub fn with_template_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, PipelineError> {
        self.template = Template::load(Some(path.as_ref()))?;
        Ok(self)
    }

    pub fn with_assets(mut self, resolver: Arc<dyn AssetResolver>) -> Self {
        self.assets = Some(resolver);
        self
    }

    /// Resolves images against `dir`, honoring the configured extension fallback.
    pub fn with_asset_dir<P: AsRef<Path>>(self, dir: P) -> Self {
        let fallback = self.config.assets.extension_fallback && self.config.layout.extension_fallback;
        let resolver = FilesystemAssetResolver::new(dir).with_extension_fallback(fallback);
        self.with_assets(Arc::new(resolver))
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Composes `directives` into a fresh in-memory document.
    pub fn build(&self, directives: &[Directive]) -> Result<RunOutcome<MemoryDocument>, PipelineError> {
        self.build_with(MemoryDocument::new(), directives)
    }

    /// Composes `directives` into `host`.
    ///
    /// A directive that fails is logged and skipped; only failures that
    /// leave nothing to write into end the run.
    pub fn build_with<H: DocumentHost>(
        &self,
        host: H,
        directives: &[Directive],
    ) -> Result<RunOutcome<H>, PipelineError> {
        let mut composer = Composer::new(
            host,
            self.config.layout.clone(),
            self.template.styles.clone(),
            self.template.default_layout(),
        )?;
        if let Some(resolver) = &self.assets {
            log::debug!("Resolving images with the {} resolver.", resolver.name());
            composer = composer.with_assets(Arc::clone(resolver));
        }

        let progress_cfg = &self.config.progress;
        let mut progress = ProgressReporter::new(
            directives.len(),
            progress_cfg.percent_step,
            Duration::from_secs(progress_cfg.heartbeat_secs),
        );
        let mut report = RunReport::default();

        for (index, directive) in directives.iter().enumerate() {
            match apply(&mut composer, directive, &mut report) {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    let e = PipelineError::from(e);
                    if e.is_fatal() {
                        log::error!("Directive #{} ({}) failed fatally: {}", index, directive.kind(), e);
                        return Err(e);
                    }
                    log::warn!("Skipping directive #{} ({}): {}", index, directive.kind(), e);
                    report.skipped += 1;
                }
            }
            progress.bump(directive.kind(), &format!("#{}", index));
        }

        report.final_flow = match composer.flush_overflow() {
            Ok(flow) => {
                if !flow.settled() {
                    log::error!("Document ends with overset content ({:?}).", flow.status);
                }
                Some(flow.status)
            }
            Err(LayoutError::Stalled { container, repeats }) => {
                log::error!("Final flush stalled in {} after {} repeats.", container, repeats);
                None
            }
            Err(e) => {
                log::error!("Final flush failed; keeping the document as composed: {}", e);
                None
            }
        };
        if let Err(e) = composer.trim_trailing_empty() {
            log::warn!("Could not trim trailing empty pages: {}", e);
        }

        let host = composer.into_host();
        report.pages = host.page_count();
        progress.finalize(&format!(
            "{} pages, {} skipped of {} directives",
            report.pages,
            report.skipped,
            directives.len()
        ));
        Ok(RunOutcome { host, report })
    }
}

fn apply<H: DocumentHost>(
    composer: &mut Composer<H>,
    directive: &Directive,
    report: &mut RunReport,
) -> Result<(), LayoutError> {
    match directive {
        Directive::Text { text } => composer.insert_run(text),
        Directive::Paragraph { style } => {
            composer.end_paragraph()?;
            if let Some(style) = style {
                composer.request_paragraph_style(style);
            }
            Ok(())
        }
        Directive::ParagraphStyle { style } => composer.apply_paragraph_style(style),
        Directive::Format { style, on } => {
            composer.set_format(*style, *on);
            Ok(())
        }
        Directive::CharStyle { style } => {
            composer.set_char_style(style.as_deref());
            Ok(())
        }
        Directive::Image { attrs } => {
            let spec = attrs.to_spec()?;
            let placed = composer.place_float(&spec)?;
            log::debug!("Placed '{}' as {:?}.", spec.src, placed.mode);
            report.floats += 1;
            Ok(())
        }
        Directive::Table(spec) => {
            let outcome = composer.place_table(spec)?;
            if outcome.widths_fallback || outcome.merges_failed > 0 || outcome.degraded_spans > 0 {
                log::warn!(
                    "{} degraded: width fallback {}, {} merges failed, {} spans flattened.",
                    outcome.table,
                    outcome.widths_fallback,
                    outcome.merges_failed,
                    outcome.degraded_spans
                );
            }
            report.tables += 1;
            Ok(())
        }
        Directive::Footnote { id, content } => {
            composer.insert_note(NoteKind::Footnote, *id, content)?;
            report.notes += 1;
            Ok(())
        }
        Directive::Endnote { id, content } => {
            composer.insert_note(NoteKind::Endnote, *id, content)?;
            report.notes += 1;
            Ok(())
        }
        Directive::Layout(layout) => composer.switch_layout(layout).map(|_| ()),
        Directive::PageBreak => composer.insert_break(BreakKind::Page),
        Directive::FrameBreak => composer.insert_break(BreakKind::Frame),
        Directive::ColumnBreak => composer.insert_break(BreakKind::Column),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::parse_directives;

    #[test]
    fn bad_directives_are_skipped() {
        let _ = env_logger::builder().is_test(true).try_init();
        let directives = parse_directives(
            r#"[
                {"type": "text", "text": "Intro"},
                {"type": "image", "attrs": "w=100pt"},
                {"type": "table", "data": []},
                {"type": "paragraph"}
            ]"#,
        )
        .unwrap();
        let outcome = DocumentBuilder::new().build(&directives).unwrap();
        assert_eq!(outcome.report.processed, 2);
        assert_eq!(outcome.report.skipped, 2);
        assert_eq!(outcome.report.final_flow, Some(FlowStatus::Settled));
        assert_eq!(outcome.report.pages, 1);
    }

    #[test]
    fn failed_final_flush_keeps_the_document() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut host = MemoryDocument::new();
        host.add_page(None, true).unwrap();
        host.options_mut().reject_new_pages = true;

        let long = "word ".repeat(4000);
        let directives = parse_directives(&serde_json::json!([{"type": "text", "text": long}]).to_string()).unwrap();
        let mut config = RunConfig::default();
        config.layout.trim_trailing_empty = true;
        let outcome = DocumentBuilder::new().with_config(config).build_with(host, &directives).unwrap();

        assert_eq!(outcome.report.processed, 1);
        assert_eq!(outcome.report.final_flow, None);
        assert_eq!(outcome.report.pages, 1);
        let snapshot = outcome.host.snapshot();
        assert!(snapshot.stories[0].overflows);
        assert!(snapshot.stories[0].text.starts_with("word word"));
    }
}
