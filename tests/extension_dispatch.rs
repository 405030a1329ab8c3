// tests/extension_dispatch.rs

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pedigree::config::ProjectConfig;
use pedigree::dag::resolve_plugins;
use pedigree::engine::CancellationToken;
use pedigree::extension::{
    Extension, ExtensionContext, ExtensionFactory, Extensions, HandlerFuture, SiteEvent,
};
use pedigree::fs::MemoryWriter;
use pedigree::plugin::{PluginDescriptor, PluginId, PluginRegistry};
use pedigree_test_utils::builders::ProjectConfigBuilder;
use pedigree_test_utils::init_tracing;

type Log = Arc<Mutex<Vec<String>>>;

/// Records when it starts and finishes handling an event.
#[derive(Debug)]
struct RecordingExtension {
    plugin_id: PluginId,
    log: Log,
    delay: Duration,
    fail: bool,
}

impl Extension for RecordingExtension {
    fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    fn handle<'a>(&'a self, _event: &'a SiteEvent) -> HandlerFuture<'a> {
        Box::pin(async move {
            self.log.lock().unwrap().push(format!("start {}", self.plugin_id));
            tokio::time::sleep(self.delay).await;
            if self.fail {
                anyhow::bail!("{} refused", self.plugin_id);
            }
            self.log.lock().unwrap().push(format!("end {}", self.plugin_id));
            Ok(())
        })
    }
}

fn register(
    registry: &mut PluginRegistry,
    descriptor: PluginDescriptor,
    log: &Log,
    delay_ms: u64,
    fail: bool,
) {
    let log = Arc::clone(log);
    let id = descriptor.id().clone();
    let factory: ExtensionFactory = Arc::new(move |_ctx: &ExtensionContext| -> Box<dyn Extension> {
        Box::new(RecordingExtension {
            plugin_id: id.clone(),
            log: Arc::clone(&log),
            delay: Duration::from_millis(delay_ms),
            fail,
        })
    });
    registry.register_extension(descriptor, factory).unwrap();
}

fn extensions_for(registry: &PluginRegistry, selected: &[&str]) -> Extensions {
    let project: Arc<ProjectConfig> = Arc::new(ProjectConfigBuilder::new().build());
    let selected: Vec<PluginId> = selected.iter().map(|s| PluginId::new(*s).unwrap()).collect();
    let batches = resolve_plugins(&selected, registry).unwrap();
    Extensions::instantiate(&batches, registry, project).unwrap()
}

fn event() -> SiteEvent {
    SiteEvent::GenerateSite {
        writer: Arc::new(MemoryWriter::new()),
        cancel: CancellationToken::new(),
    }
}

#[tokio::test]
async fn batches_run_in_order_and_handlers_within_a_batch_overlap() {
    init_tracing();

    let log: Log = Arc::default();
    let mut registry = PluginRegistry::new();
    register(&mut registry, PluginDescriptor::new("js").unwrap(), &log, 20, false);
    register(&mut registry, PluginDescriptor::new("css").unwrap(), &log, 20, false);
    register(
        &mut registry,
        PluginDescriptor::new("maps").unwrap().with_depends_on(["js", "css"]).unwrap(),
        &log,
        1,
        false,
    );

    let extensions = extensions_for(&registry, &["maps"]);
    assert_eq!(extensions.batches().count(), 2);
    assert_eq!(extensions.len(), 3);
    assert!(extensions.contains("css"));

    extensions.dispatcher().dispatch(&event()).await.unwrap();

    let log = log.lock().unwrap().clone();
    // Both first-batch handlers start before either finishes.
    assert_eq!(&log[..2], ["start css", "start js"]);
    let maps_start = log.iter().position(|l| l == "start maps").unwrap();
    let js_end = log.iter().position(|l| l == "end js").unwrap();
    let css_end = log.iter().position(|l| l == "end css").unwrap();
    assert!(js_end < maps_start);
    assert!(css_end < maps_start);
    assert_eq!(log.last().unwrap(), "end maps");
}

#[tokio::test]
async fn a_failing_handler_stops_later_batches() {
    init_tracing();

    let log: Log = Arc::default();
    let mut registry = PluginRegistry::new();
    register(&mut registry, PluginDescriptor::new("first").unwrap(), &log, 1, true);
    register(
        &mut registry,
        PluginDescriptor::new("second").unwrap().with_comes_after(["first"]).unwrap(),
        &log,
        1,
        false,
    );

    let extensions = extensions_for(&registry, &["first", "second"]);
    let err = extensions.dispatcher().dispatch(&event()).await.unwrap_err();

    assert!(format!("{err:#}").contains("first refused"));
    assert!(format!("{err:#}").contains("extension 'first' failed"));
    assert!(!log.lock().unwrap().iter().any(|l| l.contains("second")));
}

#[tokio::test]
async fn ordering_only_plugins_accept_every_event() {
    let registry = PluginRegistry::builtin().unwrap();
    let extensions = extensions_for(&registry, &["trees", "search", "cleaner"]);

    assert_eq!(
        extensions
            .iter()
            .map(|e| e.plugin_id().to_string())
            .collect::<Vec<_>>(),
        ["cleaner", "js", "trees", "search"]
    );
    extensions.dispatcher().dispatch(&event()).await.unwrap();
}

#[tokio::test]
async fn extensions_receive_their_plugin_options() {
    let project = Arc::new(
        ProjectConfigBuilder::new()
            .with_plugin_option("answering", "answer", toml::Value::Integer(42))
            .build(),
    );
    let seen: Arc<Mutex<Option<toml::Table>>> = Arc::default();

    let mut registry = PluginRegistry::new();
    let descriptor = PluginDescriptor::new("answering").unwrap();
    let id = descriptor.id().clone();
    let factory: ExtensionFactory = {
        let seen = Arc::clone(&seen);
        Arc::new(move |ctx: &ExtensionContext| -> Box<dyn Extension> {
            *seen.lock().unwrap() = Some(ctx.options.clone());
            Box::new(pedigree::extension::PassiveExtension::new(id.clone()))
        })
    };
    registry.register_extension(descriptor, factory).unwrap();

    let batches = resolve_plugins(&project.selected_plugins(), &registry).unwrap();
    Extensions::instantiate(&batches, &registry, project).unwrap();

    let options = seen.lock().unwrap().clone().unwrap();
    assert_eq!(options.get("answer").and_then(|v| v.as_integer()), Some(42));
}
