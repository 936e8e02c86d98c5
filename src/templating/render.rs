//! The rendering pipeline.
//!
//! A render runs in stages: the base directory is checked, then the template is
//! parsed, the value layers are decoded and merged, the merged mapping is
//! validated against the schemas and finally the template is executed. All
//! stages after the directory check run on a detached worker thread raced
//! against the timeout of the [`RenderContext`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tracing::debug;

use super::context::RenderContext;
use super::environment::{create_environment, root_template_name};
use super::error::RenderError;
use super::validation::validate;
use super::values::merge_layers;

/// Output of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// The rendered text.
    pub output: String,
    /// The merged context the template was executed with.
    pub values: Map<String, Value>,
}

/// Renders `context` on a worker thread within `context.timeout`.
///
/// When the timeout elapses the worker is abandoned, not cancelled: the
/// template engine offers no cancellation point, so the worker thread keeps
/// running until the template finishes on its own. It does not keep the
/// caller's runtime from shutting down.
///
/// # Errors
///
/// Returns the [`RenderError`] of the first failing stage,
/// [`RenderError::Timeout`] when the budget is exhausted and
/// [`RenderError::Panic`] when the engine panicked.
pub async fn render(context: RenderContext) -> Result<Rendered, RenderError> {
    let directory = context.source.directory.clone();
    let is_dir = tokio::fs::metadata(&directory).await.map(|m| m.is_dir()).unwrap_or(false);
    if !is_dir {
        return Err(RenderError::Loader { directory });
    }

    let timeout = context.timeout;
    let rendered = supervise(timeout, move || render_blocking(context)).await;
    if let Err(e) = &rendered {
        debug!(stage = e.stage(), "Rendering failed");
    }
    rendered
}

/// Runs the parse, values, validation and execution stages on the current thread.
///
/// No timeout applies. [`render`] is the entry point for callers that need one.
pub fn render_blocking(context: RenderContext) -> Result<Rendered, RenderError> {
    let RenderContext {
        source,
        configuration,
        values,
        schemas,
        ..
    } = context;

    let mut env =
        create_environment(&source.directory, &configuration).map_err(RenderError::Parse)?;
    let name = root_template_name(&source.template);
    env.add_template_owned(name.clone(), source.template).map_err(RenderError::Parse)?;
    debug!(template = %name, directory = %source.directory.display(), "Parsed template");

    let merged = merge_layers(&values)?;
    debug!(layers = values.len(), keys = merged.len(), "Merged values");

    validate(&merged, &schemas)?;
    debug!(schemas = schemas.len(), "Validated values");

    let template = env.get_template(&name).map_err(RenderError::Execution)?;
    let output = template.render(&merged).map_err(RenderError::Execution)?;
    debug!(bytes = output.len(), "Executed template");

    Ok(Rendered {
        output,
        values: merged,
    })
}

/// Runs `job` on a dedicated thread and waits at most `timeout` for it.
///
/// The thread is detached: after a timeout it is left running and nothing,
/// including the runtime shutting down, waits for it. A panic inside `job` is
/// turned into [`RenderError::Panic`].
pub(crate) async fn supervise<T, F>(timeout: Duration, job: F) -> Result<T, RenderError>
where
    F: FnOnce() -> Result<T, RenderError> + Send + 'static,
    T: Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    std::thread::Builder::new()
        .name("jinja-render".to_string())
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(job));
            // The receiver is gone once the render timed out.
            let _ = sender.send(outcome);
        })
        .map_err(|e| RenderError::Cancelled(format!("failed to start rendering worker: {e}")))?;

    match tokio::time::timeout(timeout, receiver).await {
        Ok(Ok(Ok(result))) => result,
        Ok(Ok(Err(payload))) => Err(RenderError::Panic(panic_message(payload))),
        Ok(Err(_)) => Err(RenderError::Cancelled("worker exited without a result".to_string())),
        Err(_) => Err(RenderError::Timeout(humantime::format_duration(timeout).to_string())),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templating::context::{Configuration, Source, Values};
    use crate::test_utils::init_test_logging;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn context(template: &str, directory: &Path, values: Vec<Values>) -> RenderContext {
        RenderContext {
            source: Source {
                template: template.to_string(),
                directory: directory.to_path_buf(),
            },
            configuration: Configuration::default(),
            values,
            schemas: BTreeMap::new(),
            timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn test_render_merges_layers() {
        let temp = TempDir::new().unwrap();
        let ctx = context(
            "{{ name }} {{ list | length }} {{ nested.inner }}",
            temp.path(),
            vec![
                Values::new("yaml", "name: yaml\nlist: [1, 2, 3]\nnested: scalar\n"),
                Values::new("json", r#"{"list": [], "nested": {"inner": "mapping"}}"#),
            ],
        );

        let rendered = render(ctx).await.unwrap();
        assert_eq!(rendered.output, "yaml 0 mapping");
        assert_eq!(rendered.values["name"], "yaml");
        assert_eq!(rendered.values["list"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_missing_directory_fails_before_parsing() {
        let ctx = context("{{ broken", &PathBuf::from("/does/not/exist"), vec![]);
        let err = render(ctx).await.unwrap_err();
        assert!(matches!(err, RenderError::Loader { .. }));
        assert!(err.to_string().starts_with("failed to create a file system loader"));
    }

    #[tokio::test]
    async fn test_stage_errors() {
        let temp = TempDir::new().unwrap();

        let err = render(context("{% if %}", temp.path(), vec![])).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to parse template: "), "{err}");

        let err = render(context("ok", temp.path(), vec![Values::new("json", "[1]")])).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to parse values: "), "{err}");

        let mut ctx = context("ok", temp.path(), vec![Values::new("json", r#"{"a": 1}"#)]);
        ctx.schemas.insert("strings".to_string(), r#"{"properties": {"a": {"type": "string"}}}"#.to_string());
        let err = render(ctx).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to validate context against schema: \nfailed to pass 'strings'"), "{err}");

        let err = render(context("{{ 'x' | fail }}", temp.path(), vec![])).await.unwrap_err();
        assert!(matches!(err, RenderError::Execution(_)));
        assert!(err.to_string().starts_with("failed to execute template: "), "{err}");
    }

    #[tokio::test]
    async fn test_parse_error_wins_over_values_error() {
        let temp = TempDir::new().unwrap();
        let err = render(context("{{", temp.path(), vec![Values::new("json", "{")])).await.unwrap_err();
        assert!(matches!(err, RenderError::Parse(_)));
    }

    #[tokio::test]
    async fn test_includes_resolve_against_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("partials")).unwrap();
        fs::write(temp.path().join("partials/greeting.j2"), "hello {{ name }}").unwrap();
        let ctx = context(
            "{% include 'partials/greeting.j2' %}!",
            temp.path(),
            vec![Values::new("toml", "name = \"toml\"")],
        );
        assert_eq!(render(ctx).await.unwrap().output, "hello toml!");
    }

    #[test]
    fn test_render_blocking_without_runtime() {
        let temp = TempDir::new().unwrap();
        let rendered = render_blocking(context("{{ 1 + 1 }}", temp.path(), vec![])).unwrap();
        assert_eq!(rendered.output, "2");
        assert!(rendered.values.is_empty());
    }

    #[tokio::test]
    async fn test_supervise_converts_panics() {
        let err = supervise::<(), _>(Duration::from_secs(5), || panic!("engine exploded")).await.unwrap_err();
        assert!(matches!(err, RenderError::Panic(ref message) if message == "engine exploded"));
        assert_eq!(err.to_string(), "a runtime error led the jinja engine to panic: engine exploded");

        let err = supervise::<(), _>(Duration::from_secs(5), || panic!("{} exploded", "formatted"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "a runtime error led the jinja engine to panic: formatted exploded");
    }

    #[tokio::test]
    async fn test_supervise_times_out() {
        let err = supervise(Duration::from_millis(20), || {
            std::thread::sleep(Duration::from_millis(300));
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, RenderError::Timeout(_)));
        assert_eq!(err.to_string(), "rendering timed out after 20ms");
    }

    const ENDLESS: &str = "{% for i in range(5000) %}{% for j in range(5000) %}{% for k in range(5000) %}{% endfor %}{% endfor %}{% endfor %}";

    #[tokio::test]
    async fn test_render_times_out_on_endless_template() {
        init_test_logging(None);
        let temp = TempDir::new().unwrap();
        let mut ctx = context(ENDLESS, temp.path(), vec![]);
        ctx.timeout = Duration::from_millis(50);

        let err = render(ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "rendering timed out after 50ms");
    }

    #[test]
    fn test_runtime_shuts_down_after_timed_out_render() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(ENDLESS, temp.path(), vec![]);
        ctx.timeout = Duration::from_millis(50);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(render(ctx));
        assert!(matches!(result, Err(RenderError::Timeout(_))));

        let (dropped, wait) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            drop(runtime);
            let _ = dropped.send(());
        });
        assert!(wait.recv_timeout(Duration::from_secs(5)).is_ok(), "runtime still waiting on the render worker");
    }
}
