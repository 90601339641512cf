//! archetyper's main application entry point.
//! Parses arguments, collects property values and runs the generation.

use archetyper::{
    archetype::Archetype,
    build_tool::{run_build_tool, MavenInvoker},
    cli::{get_args, Args},
    error::{default_error_handler, Result},
    loader::ArchetypeSource,
    prompt::{DialoguerPrompter, Prompter},
    variables::{bind_variables, collect_properties},
};

/// Main application entry point.
fn main() {
    let args = get_args();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Off
        })
        .init();

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Resolves the archetype source (local directory or git clone)
/// 2. Loads the archetype descriptor
/// 3. Binds properties from all sources
/// 4. Generates the project
/// 5. Optionally runs build goals in the generated project
fn run(args: Args) -> Result<()> {
    let prompt = DialoguerPrompter::new();

    let source = ArchetypeSource::from_string(&args.archetype);
    println!("Using archetype from the {source}");
    let archetype_root = source.load(&prompt, args.skip_overwrite_check)?;
    let archetype = Archetype::open(&archetype_root)?;

    let properties = collect_properties(&args)?;
    let prompter = args.interactive.then_some(&prompt as &dyn Prompter);
    let variables = bind_variables(archetype.descriptor(), properties, prompter)?;

    let project = archetype.generate(&args.output_dir, &variables)?;
    for file in &project.files {
        println!("Generated: '{}'", file.target.display());
    }

    if !args.build.is_empty() {
        let maven = MavenInvoker::new(args.mvn.clone());
        run_build_tool(&maven, &args.build, &project.root)?;
    }

    println!("Project generation completed successfully in {}.", project.root.display());
    Ok(())
}
