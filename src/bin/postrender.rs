//! postrender: render annotated posts and convert BibTeX bibliographies.
//!
//! ```text
//! postrender render posts/hello/post.md --template index.html -o hello.html
//! postrender render posts/hello/post.md --json
//! postrender bib2html refs.bib bib.html
//! ```

use annotated_post::bibliography::bibtex_to_html;
use annotated_post::render::page::references_section;
use annotated_post::{FsLoader, Loader, MathBackend, PostRenderer, RenderOptions};
use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a markdown post to HTML
    Render(RenderArgs),

    /// Convert a BibTeX file to a bib.html fragment
    #[command(name = "bib2html")]
    Bib2Html {
        /// BibTeX input
        input: PathBuf,
        /// HTML output
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Markdown file, relative to --root
    md_path: Option<String>,

    /// Directory paths are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Base URL to fetch from instead of --root
    #[cfg(feature = "http")]
    #[arg(long)]
    base_url: Option<String>,

    /// Options file (TOML); flags override its values
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Bibliography fragment
    #[arg(long)]
    bib: Option<String>,

    /// Id of the element receiving the post
    #[arg(long)]
    container: Option<String>,

    /// Host page to inject the post into
    #[arg(long)]
    template: Option<String>,

    /// Write a complete HTML document
    #[arg(long)]
    standalone: bool,

    /// Math backend
    #[arg(long, value_parser = ["katex", "mathjax", "mathml", "none"])]
    math: Option<String>,

    /// Print the render result as JSON
    #[arg(long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// `POSTRENDER_LOG` takes precedence over `-v`.
fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env("POSTRENDER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render(args) => render(args),
        Commands::Bib2Html { input, output } => bib2html(&input, &output),
    }
}

fn options_from(args: &RenderArgs) -> Result<RenderOptions> {
    let mut options = match &args.config {
        Some(path) => RenderOptions::from_toml_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => RenderOptions::default(),
    };

    if let Some(md_path) = &args.md_path {
        options.md_path = md_path.clone();
    }
    if let Some(bib) = &args.bib {
        options.bib_path = bib.clone();
    }
    if let Some(container) = &args.container {
        options.container_id = container.clone();
    }
    if let Some(template) = &args.template {
        options.template = Some(template.clone());
    }
    if args.standalone {
        options.standalone = true;
    }
    match args.math.as_deref() {
        Some("none") => options.math.enabled = false,
        Some("mathjax") => options.math.backend = MathBackend::MathJax,
        Some("mathml") => options.math.backend = MathBackend::MathML,
        Some("katex") => options.math.backend = MathBackend::KaTeX,
        _ => {}
    }

    options.validate()?;
    Ok(options)
}

fn loader_for(args: &RenderArgs) -> Box<dyn Loader> {
    #[cfg(feature = "http")]
    if let Some(base) = &args.base_url {
        return Box::new(annotated_post::HttpLoader::new(base.clone()));
    }
    Box::new(FsLoader::new(&args.root))
}

fn render(args: RenderArgs) -> Result<()> {
    let options = options_from(&args)?;
    let loader = loader_for(&args);
    let renderer = PostRenderer::for_options(&options);

    let post = renderer
        .render_post(loader.as_ref(), &options)
        .with_context(|| format!("Failed to render {}", options.md_path))?;
    info!(
        md_path = %options.md_path,
        citations = post.seen.len(),
        footnotes = post.footnotes.len(),
        "rendered post"
    );

    let output = if args.json {
        post.to_json()?
    } else {
        match renderer.page(loader.as_ref(), &post, &options)? {
            Some(page) => page,
            None => format!(
                "{}\n{}",
                post.container.html,
                references_section(&post.references_html)
            ),
        }
    };

    write_output(args.output.as_deref(), &output)
}

fn bib2html(input: &Path, output: &Path) -> Result<()> {
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let html = bibtex_to_html(&source);
    std::fs::write(output, html).with_context(|| format!("Failed to write {}", output.display()))?;
    info!(input = %input.display(), output = %output.display(), "wrote bibliography");
    Ok(())
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}
