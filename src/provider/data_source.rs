//! The `jinja_template` data source.

use std::path::PathBuf;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::debug;

use super::diagnostics::Diagnostics;
use super::model::{DataSourceModel, TemplateState};
use super::schema::{HEADER_FOOTER_DEPRECATION, TEMPLATE_DEPRECATION};
use super::{JinjaProvider, apply_overrides};
use crate::templating::utils::{absolute_path, dir_name};
use crate::templating::{Configuration, RenderContext, Source, Values, ValuesError, ValuesFormat, render};

/// Read timeout used when `timeouts.read` is not set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Renders a template from the configuration of one data source block.
#[derive(Debug, Clone, Default)]
pub struct TemplateDataSource {
    configuration: Configuration,
}

impl TemplateDataSource {
    pub const TYPE_NAME: &'static str = "jinja_template";

    /// Creates a data source inheriting the provider level `configuration`.
    pub const fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
        }
    }

    /// Engine configuration inherited from the provider.
    pub const fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Checks a data source block without rendering anything.
    ///
    /// Errors: `source` set together with `template`, `header` or `footer`,
    /// neither `source` nor `template` set, more than one `source` block, an
    /// unsupported context type or an unparsable read timeout. Each deprecated
    /// attribute in use adds a warning.
    pub fn validate_config(&self, model: &DataSourceModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        let legacy = [
            ("template", &model.template),
            ("header", &model.header),
            ("footer", &model.footer),
        ];
        if !model.source.is_empty() {
            for (name, value) in &legacy {
                if value.is_some() {
                    diagnostics
                        .add_error(
                            "Invalid Attribute Combination",
                            format!("These attributes cannot be configured together: [source,{name}]"),
                        )
                        .attribute = Some("source".to_string());
                }
            }
        }
        if model.source.is_empty() && model.template.is_none() {
            diagnostics.add_error(
                "Invalid Attribute Combination",
                "At least one attribute out of [source,template] must be specified",
            );
        }
        if model.source.len() > 1 {
            diagnostics
                .add_error(
                    "Invalid Attribute Value",
                    format!("Attribute source list must contain at most 1 elements, got: {}", model.source.len()),
                )
                .attribute = Some("source".to_string());
        }

        for (index, context) in model.context.iter().enumerate() {
            if let Err(ValuesError::UnsupportedFormat { format, suggestion }) = context.kind.parse::<ValuesFormat>() {
                let expected: Vec<String> = ValuesFormat::SUPPORTED.iter().map(|name| format!("\"{name}\"")).collect();
                let mut detail = format!(
                    "Attribute context[{index}].type value must be one of: [{}], got: \"{format}\"",
                    expected.join(" ")
                );
                if let Some(name) = suggestion {
                    detail.push_str(&format!(" (did you mean '{name}'?)"));
                }
                diagnostics.add_error("Invalid Attribute Value Match", detail).attribute =
                    Some(format!("context[{index}].type"));
            }
        }

        if let Err(detail) = read_timeout(model) {
            diagnostics.add_error("Timeout Cannot Be Parsed", detail).attribute = Some("timeouts.read".to_string());
        }

        for (name, value) in legacy {
            if value.is_some() {
                let message = if name == "template" {
                    TEMPLATE_DEPRECATION
                } else {
                    HEADER_FOOTER_DEPRECATION
                };
                debug!(attribute = name, "{message}");
                diagnostics.add_warning("Attribute Deprecated", message).attribute = Some(name.to_string());
            }
        }

        diagnostics
    }

    /// Renders the data source and computes its state.
    ///
    /// Data source settings override the inherited configuration field by
    /// field. `id` is the hex SHA-256 of `result` and `merged_context` the
    /// JSON encoding of the merged context.
    ///
    /// # Errors
    ///
    /// Error diagnostics when the block cannot be turned into a render or the
    /// render fails, e.g. `Failed to render` / `Rendering context returned an
    /// error: failed to parse values: ...`.
    pub async fn read(&self, model: &DataSourceModel) -> Result<TemplateState, Diagnostics> {
        let context = self.render_context(model).await?;
        debug!(
            directory = %context.source.directory.display(),
            layers = context.values.len(),
            schemas = context.schemas.len(),
            timeout = %humantime::format_duration(context.timeout),
            "Reading {}", Self::TYPE_NAME
        );

        let rendered = render(context).await.map_err(|e| {
            let mut diagnostics = Diagnostics::new();
            diagnostics.add_error("Failed to render", format!("Rendering context returned an error: {e}"));
            diagnostics
        })?;

        let merged_context = serde_json::to_string(&rendered.values).map_err(|e| {
            let mut diagnostics = Diagnostics::new();
            diagnostics.add_error(
                "Failed to build `merged_context` field",
                format!("Marshalling returned values returned an error: {e}"),
            );
            diagnostics
        })?;

        Ok(TemplateState {
            id: hex::encode(Sha256::digest(rendered.output.as_bytes())),
            result: rendered.output,
            merged_context,
        })
    }

    async fn render_context(&self, model: &DataSourceModel) -> Result<RenderContext, Diagnostics> {
        let mut configuration = self.configuration.clone();
        apply_overrides(
            &mut configuration,
            model.strict_undefined,
            model.trim_blocks,
            model.left_strip_blocks,
            model.delimiters.as_ref(),
        );

        let values = model
            .context
            .iter()
            .map(|context| Values::new(context.kind.as_str(), context.data.as_bytes()))
            .collect();

        let timeout = read_timeout(model).map_err(|detail| {
            let mut diagnostics = Diagnostics::new();
            diagnostics.add_error("Timeout Cannot Be Parsed", detail).attribute = Some("timeouts.read".to_string());
            diagnostics
        })?;

        Ok(RenderContext {
            source: self.source(model).await?,
            configuration,
            values,
            schemas: model.validation.clone().unwrap_or_default(),
            timeout,
        })
    }

    async fn source(&self, model: &DataSourceModel) -> Result<Source, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        let working_directory = match std::env::current_dir() {
            Ok(directory) => directory,
            Err(e) => {
                diagnostics.add_error("Unexpected error", format!("failed to get the current work directory: {e}"));
                return Err(diagnostics);
            }
        };

        if let Some(template) = &model.template {
            let mut source = match tokio::fs::read_to_string(template).await {
                Ok(content) => match absolute_path(&working_directory, template) {
                    Ok(path) => {
                        debug!(path = %path, "Read legacy template from file");
                        Source {
                            template: content,
                            directory: PathBuf::from(dir_name(&path)),
                        }
                    }
                    Err(e) => {
                        diagnostics.add_error(
                            "Invalid path",
                            format!("Failed to get an absolute path out of \"{template}\": {e}"),
                        );
                        return Err(diagnostics);
                    }
                },
                Err(_) => Source {
                    template: template.clone(),
                    directory: working_directory,
                },
            };
            if let Some(header) = &model.header {
                source.template = format!("{header}\n{}", source.template);
            }
            if let Some(footer) = &model.footer {
                source.template = format!("{}\n{footer}", source.template);
            }
            return Ok(source);
        }

        let Some(block) = model.source.first() else {
            diagnostics.add_error(
                "Missing template",
                "At least one attribute out of [source,template] must be specified",
            );
            return Err(diagnostics);
        };
        match absolute_path(&working_directory, &block.directory) {
            Ok(directory) => Ok(Source {
                template: block.template.clone(),
                directory: PathBuf::from(directory),
            }),
            Err(e) => {
                diagnostics.add_error(
                    "Invalid path",
                    format!("failed to get an absolute path from the given directory: {e}"),
                );
                Err(diagnostics)
            }
        }
    }
}

impl From<&JinjaProvider> for TemplateDataSource {
    fn from(provider: &JinjaProvider) -> Self {
        Self::new(provider.configuration().clone())
    }
}

/// Parses `timeouts.read`, falling back to [`DEFAULT_TIMEOUT`].
fn read_timeout(model: &DataSourceModel) -> Result<Duration, String> {
    match model.timeouts.as_ref().and_then(|timeouts| timeouts.read.as_deref()) {
        None => Ok(DEFAULT_TIMEOUT),
        Some(read) => humantime::parse_duration(read).map_err(|e| format!("timeouts read \"{read}\": {e}")),
    }
}
