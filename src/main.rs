use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use product_configurator::app::{parse_script, print_final_state, run_script};
use product_configurator::{
    ConfiguratorConfig, ConfiguratorSession, ManualClock, PartCategory, Scene, TextureLibrary,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let config = match &options.config {
        Some(path) => ConfiguratorConfig::load(path)?,
        None => ConfiguratorConfig::default(),
    };

    let xml = fs::read_to_string(&options.scene)
        .with_context(|| format!("failed to read scene {}", options.scene.display()))?;
    let scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;

    let clock = Arc::new(ManualClock::new());
    let textures = TextureLibrary::new(Some(scene_dir(&options.scene)));
    let mut session = ConfiguratorSession::new(config, clock.clone()).with_textures(textures);
    session.load_scene(scene);

    let registry = session.registry();
    println!("Loaded scene with {} parts", registry.len());
    for category in PartCategory::ALL {
        let parts = registry.parts(category);
        if !parts.is_empty() {
            let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
            println!(" - {category}: {}", names.join(", "));
        }
    }

    if let Some(path) = &options.script {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        let steps = parse_script(&source)?;
        println!("Replaying {} step(s)", steps.len());
        let stdout = io::stdout();
        run_script(&mut session, &clock, &steps, &mut stdout.lock())?;
    }

    if !options.summary_only {
        let camera = session.camera();
        println!(
            "Camera at ({:.2}, {:.2}, {:.2})",
            camera.position.x, camera.position.y, camera.position.z
        );
    }

    session.shutdown();
    print_final_state(session.store());
    Ok(())
}

fn scene_dir(scene: &Path) -> PathBuf {
    scene
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

struct CliOptions {
    scene: PathBuf,
    config: Option<PathBuf>,
    script: Option<PathBuf>,
    summary_only: bool,
}

const USAGE: &str =
    "Usage: product-configurator <scene.xml> [--config <file>] [--script <file>] [--summary-only]";

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(scene) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut config = None;
        let mut script = None;
        let mut summary_only = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    config = Some(PathBuf::from(
                        args.next().ok_or_else(|| anyhow!("--config needs a path"))?,
                    ));
                }
                "--script" => {
                    script = Some(PathBuf::from(
                        args.next().ok_or_else(|| anyhow!("--script needs a path"))?,
                    ));
                }
                "--summary-only" => summary_only = true,
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(Self {
            scene: PathBuf::from(scene),
            config,
            script,
            summary_only,
        })
    }
}
