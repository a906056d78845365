use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use salus_common::blocks::PageDocument;
use salus_common::config::{RenderConfig, SanitizerStrategy};
use salus_render::page::PageRenderContext;
use salus_render::{render_page, sanitizer_from_config, to_html, to_markdown};

#[derive(Parser)]
#[command(version, about = "Salus - content rendering and sanitization for the CMS", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a JSON render configuration (policy, strategy, markdown)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a page document (JSON page + blocks) to a full HTML page
    Render {
        /// Path to the page document
        source: PathBuf,

        /// Write the HTML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Sanitize an HTML fragment from a file or stdin
    Sanitize {
        /// Path to the fragment; reads stdin when omitted
        source: Option<PathBuf>,

        /// Override the configured sanitizer strategy
        #[arg(long)]
        strategy: Option<Strategy>,
    },
    /// Convert between markdown and HTML
    Convert {
        /// Path to the input; reads stdin when omitted
        source: Option<PathBuf>,

        /// Conversion direction
        #[arg(long, value_enum, default_value = "html")]
        to: Direction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Purifier,
    Dom,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    /// Markdown in, HTML out
    Html,
    /// HTML in, markdown out
    Markdown,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };

    match cli.command {
        Commands::Render { source, output } => render(&config, &source, output.as_deref()),
        Commands::Sanitize { source, strategy } => sanitize(config, source.as_deref(), strategy),
        Commands::Convert { source, to } => convert(&config, source.as_deref(), to),
    }
}

fn render(
    config: &RenderConfig,
    source: &std::path::Path,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let raw = std::fs::read_to_string(source).into_diagnostic()?;
    let document: PageDocument = serde_json::from_str(&raw).into_diagnostic()?;
    tracing::debug!(
        title = %document.page.title,
        blocks = document.blocks.len(),
        "rendering page document"
    );
    let sanitizer = sanitizer_from_config(config);
    let ctx = PageRenderContext::new(config.markdown_options(), sanitizer.as_ref());
    let html = render_page(&document.page, &document.blocks, &ctx);
    emit(&html, output)
}

fn sanitize(
    mut config: RenderConfig,
    source: Option<&std::path::Path>,
    strategy: Option<Strategy>,
) -> Result<()> {
    if let Some(strategy) = strategy {
        config.sanitizer = match strategy {
            Strategy::Purifier => SanitizerStrategy::Purifier,
            Strategy::Dom => SanitizerStrategy::Dom,
        };
    }
    let input = read_source(source)?;
    let sanitizer = sanitizer_from_config(&config);
    println!("{}", sanitizer.sanitize(&input));
    Ok(())
}

fn convert(config: &RenderConfig, source: Option<&std::path::Path>, to: Direction) -> Result<()> {
    let input = read_source(source)?;
    let output = match to {
        Direction::Html => to_html(&input, &config.markdown_options()),
        Direction::Markdown => to_markdown(&input),
    };
    println!("{output}");
    Ok(())
}

fn read_source(source: Option<&std::path::Path>) -> Result<String> {
    match source {
        Some(path) => std::fs::read_to_string(path).into_diagnostic(),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .into_diagnostic()?;
            Ok(buffer)
        }
    }
}

fn emit(content: &str, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content).into_diagnostic(),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}
