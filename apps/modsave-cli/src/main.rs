use clap::{Parser, Subcommand};
use modsave_common::Transform;
use modsave_persist::{SaveSession, TenantPayload};
use modsave_scene::{Scene, SceneObject};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modsave-cli", about = "CLI tool for modsave operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a save/load round trip against a synthetic scene
    Demo {
        /// Persistent-data root to write the slot file under
        #[arg(short, long, default_value = "modsave_data")]
        root: PathBuf,
        /// Save slot to use
        #[arg(short, long, default_value = "1")]
        slot: u32,
        /// Number of objects to register
        #[arg(short, long, default_value = "3")]
        objects: usize,
    },
    /// Print the tenants inside a .modsave container file
    Inspect {
        /// Path to a slot<N>.modsave file
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Demo {
            root,
            slot,
            objects,
        } => {
            println!("Save pass: {objects} objects, slot {slot}");

            // First session: the host saves, then every tenant saves.
            let scene = Rc::new(RefCell::new(build_scene(objects)));
            let mut session = SaveSession::new(&root, slot, Rc::clone(&scene));
            register_notes_tenant(&mut session);
            let report = session.save_all()?;
            println!("Container written to {}", report.path.display());
            for (key, outcome) in &report.tenants {
                println!("  {key}: {outcome:?}");
            }

            // Second session: simulates the next host load with a freshly
            // constructed scene holding the same objects in the same order.
            println!("Load pass: fresh session, same scene shape");
            let scene = Rc::new(RefCell::new(build_scene(objects)));
            let mut session = SaveSession::new(&root, slot, Rc::clone(&scene));
            register_notes_tenant(&mut session);
            session.load_all()?;

            for obj in scene.borrow().objects_registered_to_save() {
                match obj.guid() {
                    Some(guid) => println!("  {} -> {guid}", obj.name()),
                    None => println!("  {} -> (untagged)", obj.name()),
                }
            }
        }
        Commands::Inspect { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let payloads: Vec<TenantPayload> = serde_json::from_str(&raw)?;
            println!("{}: {} tenant(s)", file.display(), payloads.len());
            for entry in &payloads {
                println!("  {} ({} bytes)", entry.tenant_key, entry.payload.len());
            }
        }
    }

    Ok(())
}

fn build_scene(objects: usize) -> Scene {
    let mut scene = Scene::new();
    for i in 0..objects {
        scene.register(SceneObject::new(
            format!("object_{i}"),
            "demo",
            Transform {
                position: glam::Vec3::new(i as f32 * 2.0, 0.0, 0.0),
                ..Transform::default()
            },
        ));
    }
    scene
}

fn register_notes_tenant(session: &mut SaveSession) {
    session.registry_mut().register_fns(
        "demo_notes",
        || Ok("demo payload".to_string()),
        |payload| {
            tracing::debug!(payload, "notes tenant loaded");
            Ok(())
        },
    );
}
