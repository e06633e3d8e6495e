//! Track Geometry CLI
//!
//! Usage:
//!   track-geometry [OPTIONS] [ARTICLES]...
//!
//! Options:
//!   -c, --catalog <FILE>  Track catalog (TOML format)
//!       --config <FILE>   Engine configuration (TOML format)
//!   -l, --list            List catalog articles
//!       --shape <CODE>    Print path data, bounds and ports of one article
//!       --port <PORT>     Entry port for --shape (default A)
//!       --preview <CODE>  Print the catalog preview glyph as SVG
//!       --groups          Print connected groups instead of SVG
//!   -d, --debug           Mark open ports in the SVG
//!   -h, --help            Print help

use std::path::PathBuf;

use clap::Parser;

use track_geometry::layout::all_groups;
use track_geometry::{
    build_chain, render_plan, render_preview_svg, Catalog, EngineConfig, PortId, RenderConfig,
    ShapeLibrary, SvgConfig, TrackError,
};

#[derive(Parser)]
#[command(name = "track-geometry")]
#[command(about = "Track plan geometry and topology for model railways")]
struct Cli {
    /// Article codes laid end to end (e.g. G231 R1 R1 WR)
    articles: Vec<String>,

    /// Track catalog file (TOML format)
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Engine configuration file (TOML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// List catalog articles
    #[arg(short, long)]
    list: bool,

    /// Print path data, bounds and ports of one article
    #[arg(long, value_name = "CODE")]
    shape: Option<String>,

    /// Entry port used with --shape
    #[arg(long, default_value = "A")]
    port: String,

    /// Print the catalog preview glyph of one article as SVG
    #[arg(long, value_name = "CODE")]
    preview: Option<String>,

    /// Print connected groups instead of SVG
    #[arg(long)]
    groups: bool,

    /// Debug mode: mark open ports
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "track_geometry=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => match Catalog::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading catalog '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Catalog::default(),
    };

    let config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let mut library = ShapeLibrary::new(catalog);

    if cli.list {
        print_catalog(library.catalog());
        return;
    }

    let result = if let Some(code) = &cli.shape {
        describe_shape(&mut library, code, &cli.port)
    } else if let Some(code) = &cli.preview {
        library
            .default_shape(code)
            .and_then(|shape| render_preview_svg(&shape, &config.preview))
    } else if cli.articles.is_empty() {
        print_intro();
        return;
    } else {
        let codes: Vec<&str> = cli.articles.iter().map(String::as_str).collect();
        if cli.groups {
            describe_groups(&mut library, &codes, &config)
        } else {
            let render = RenderConfig::new()
                .with_engine(config)
                .with_svg(SvgConfig::default())
                .with_debug(cli.debug);
            build_chain(&mut library, &codes, &config.snap)
                .and_then(|plan| render_plan(&plan, &render))
        }
    };

    match result {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_catalog(catalog: &Catalog) {
    println!("{:<8} {:<15} {:<8} NAME", "CODE", "FAMILY", "PORTS");
    for spec in catalog.iter() {
        let ports: String = spec
            .family
            .port_ids()
            .iter()
            .map(|p| p.as_char())
            .collect();
        println!(
            "{:<8} {:<15} {:<8} {}",
            spec.code,
            spec.family.kind(),
            ports,
            spec.name
        );
    }
}

fn describe_shape(
    library: &mut ShapeLibrary,
    code: &str,
    port: &str,
) -> Result<String, TrackError> {
    let entry: PortId = port.parse()?;
    let shape = library.shape(code, entry)?;

    let mut out = String::new();
    out.push_str(&format!("article: {} (entry {})\n", shape.article, shape.entry_port));
    out.push_str(&format!("path: {}\n", shape.path.to_svg_d()));
    out.push_str(&format!(
        "bounds: {:.2} {:.2} {:.2} {:.2}\n",
        shape.bounds.min_x, shape.bounds.min_y, shape.bounds.max_x, shape.bounds.max_y
    ));
    for p in &shape.ports {
        out.push_str(&format!(
            "port {}: ({:.2}, {:.2}) {:.1}\n",
            p.id, p.position.x, p.position.y, p.direction
        ));
    }
    Ok(out.trim_end().to_string())
}

fn describe_groups(
    library: &mut ShapeLibrary,
    codes: &[&str],
    config: &EngineConfig,
) -> Result<String, TrackError> {
    let plan = build_chain(library, codes, &config.snap)?;
    let groups = all_groups(&plan, &config.snap)?;

    let mut lines = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        let members = group
            .iter()
            .map(|id| plan.get(*id).map(|s| format!("{}:{}", id, s.article())))
            .collect::<Result<Vec<_>, _>>()?;
        lines.push(format!("group {}: {}", index + 1, members.join(" ")));
    }
    Ok(lines.join("\n"))
}

fn print_intro() {
    println!(
        r#"Track Geometry - track plan geometry and topology for model railways

USAGE:
    track-geometry [OPTIONS] [ARTICLES]...

OPTIONS:
    -c, --catalog <FILE>   Track catalog (TOML file)
        --config <FILE>    Engine configuration (TOML file)
    -l, --list             List catalog articles
        --shape <CODE>     Show path, bounds and ports (with --port <PORT>)
        --preview <CODE>   Catalog preview glyph as SVG
        --groups           Print connected groups instead of SVG
    -d, --debug            Mark open ports
    -h, --help             Print help

QUICK START:
    track-geometry G231 R1 R1 R1 WR > plan.svg

Each article is attached to the first open exit port of the previous one.
Run --list to see the available articles."#
    );
}
