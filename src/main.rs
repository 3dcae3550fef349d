use dom::{Document, DomError, NodeKey};
use observer::{
    Delivery, MutationObserver, MutationRecord, ObserveConfig, ObserverError, ObserverSettings,
    SettingsError,
};
use std::fmt;
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Nodes the scripted edits operate on.
struct Scene {
    list: NodeKey,
    items: Vec<NodeKey>,
    caption: NodeKey,
}

type Edit = fn(&mut Document, &Scene) -> Result<(), DomError>;

const SCRIPT: &[(&str, Edit)] = &[
    ("append an item", append_item),
    ("retitle the list", retitle_list),
    ("move the first item to the end", move_first_to_end),
    ("swap two neighbours", swap_neighbours),
    ("rewrite the caption", rewrite_caption),
    ("drop an item", drop_item),
];

fn append_item(doc: &mut Document, scene: &Scene) -> Result<(), DomError> {
    let li = doc.create_element("li");
    doc.append_child(scene.list, li)
}

fn retitle_list(doc: &mut Document, scene: &Scene) -> Result<(), DomError> {
    doc.set_attribute(scene.list, "title", "renamed").map(drop)
}

fn move_first_to_end(doc: &mut Document, scene: &Scene) -> Result<(), DomError> {
    let last = doc.children(scene.list).len();
    doc.move_to(scene.list, scene.items[0], last)
}

fn swap_neighbours(doc: &mut Document, scene: &Scene) -> Result<(), DomError> {
    doc.move_to(scene.list, scene.items[3], 1)
}

fn rewrite_caption(doc: &mut Document, scene: &Scene) -> Result<(), DomError> {
    doc.set_text(scene.caption, "edited")
}

fn drop_item(doc: &mut Document, scene: &Scene) -> Result<(), DomError> {
    doc.destroy(scene.items[3])
}

enum DemoError {
    Settings(String, SettingsError),
    Io(String, std::io::Error),
    Dom(DomError),
    Observer(ObserverError),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::Settings(path, err) => write!(f, "{path}: {err}"),
            DemoError::Io(path, err) => write!(f, "cannot read {path}: {err}"),
            DemoError::Dom(err) => write!(f, "edit failed: {err}"),
            DemoError::Observer(err) => write!(f, "{err}"),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("treewatch: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), DemoError> {
    let settings = load_settings(std::env::args().nth(1))?;
    let mut doc = Document::new();
    let scene = build_scene(&mut doc).map_err(DemoError::Dom)?;

    let mut observer = MutationObserver::with_settings(
        settings,
        |records: &[MutationRecord<NodeKey>], delivery: &mut Delivery<'_, Document>| {
            for record in records {
                println!("  [watch {}] {}", delivery.handle().0, describe(record));
            }
            Ok(())
        },
    );
    let body = doc.children(doc.root())[0];
    observer.observe(
        &doc,
        body,
        ObserveConfig::new()
            .child_list()
            .attributes()
            .character_data()
            .subtree(),
    );
    log::info!(
        "watching body every {:?}",
        observer.scheduler().period()
    );

    for (label, edit) in SCRIPT {
        println!("{label}");
        edit(&mut doc, &scene).map_err(DemoError::Dom)?;
        observer
            .poll_blocking(&mut doc)
            .map_err(DemoError::Observer)?;
    }

    println!("final tree:");
    for line in dom::debug::outline(&doc, body) {
        println!("  {line}");
    }
    observer.disconnect();
    Ok(())
}

fn load_settings(path: Option<String>) -> Result<ObserverSettings, DemoError> {
    let Some(path) = path else {
        return Ok(ObserverSettings::default());
    };
    let text = std::fs::read_to_string(&path).map_err(|err| DemoError::Io(path.clone(), err))?;
    ObserverSettings::from_toml_str(&text).map_err(|err| DemoError::Settings(path, err))
}

fn build_scene(doc: &mut Document) -> Result<Scene, DomError> {
    let body = doc.create_element("body");
    doc.append_child(doc.root(), body)?;
    let caption_holder = doc.create_element("p");
    doc.append_child(body, caption_holder)?;
    let caption = doc.create_text("caption");
    doc.append_child(caption_holder, caption)?;
    let list = doc.create_element("ol");
    doc.append_child(body, list)?;
    let mut items = Vec::new();
    for i in 0..6 {
        let li = doc.create_element("li");
        doc.set_attribute(li, "data-index", &i.to_string())?;
        doc.append_child(list, li)?;
        items.push(li);
    }
    Ok(Scene {
        list,
        items,
        caption,
    })
}

fn describe(record: &MutationRecord<NodeKey>) -> String {
    let mut out = format!("{} on #{}", record.kind.as_str(), record.target.0);
    if record.is_move() {
        out.push_str(" (move)");
    }
    if !record.added_nodes.is_empty() {
        out.push_str(&format!(" +{:?}", keys(&record.added_nodes)));
    }
    if !record.removed_nodes.is_empty() {
        out.push_str(&format!(" -{:?}", keys(&record.removed_nodes)));
    }
    if let Some(name) = &record.attribute_name {
        out.push_str(&format!(" @{name}"));
    }
    if let Some(old) = &record.old_value {
        out.push_str(&format!(" was {old:?}"));
    }
    out
}

fn keys(nodes: &[NodeKey]) -> Vec<u32> {
    nodes.iter().map(|key| key.0).collect()
}
