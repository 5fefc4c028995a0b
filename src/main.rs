use std::path::Path;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use release_pilot::config::{self, Config};
use release_pilot::error::ReleaseError;
use release_pilot::exec::ProcessExecutor;
use release_pilot::git::Git2Backend;
use release_pilot::guard::RepositoryStateGuard;
use release_pilot::release::ReleaseStateMachine;
use release_pilot::ui;
use release_pilot::version::{self, BumpKind};

#[derive(Parser)]
#[command(
    name = "release-pilot",
    version,
    about = "Guarded release automation: feature branches, synced version bumps, quality gates, tags"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path", global = true)]
    config: Option<String>,

    #[arg(short = 'y', long, help = "Skip confirmation prompts", global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new feature branch off the default branch
    Feature {
        /// Name of the feature (e.g. 'add-auth-command')
        name: String,
    },
    /// Prepare a patch release (bug fixes)
    Patch,
    /// Prepare a minor release (new features, backwards compatible)
    Minor,
    /// Prepare a major release (breaking changes)
    Major,
    /// Create and push the release tag (run after the PR is merged)
    Publish,
    /// Prepare and publish in one step, without a review checkpoint
    FullRelease {
        /// Kind of version bump: patch, minor or major
        kind: String,
    },
    /// Verify that all version sources declare the same version
    CheckVersion,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(args) {
        ui::display_error(&format!("{:#}", err));
        let code = err
            .downcast_ref::<ReleaseError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(args: Args) -> Result<()> {
    let config = config::load_config(args.config.as_deref())?;

    // check-version is the one command that needs no repository access;
    // it doubles as the default version-sync gate.
    if let Some(Commands::CheckVersion) = args.command {
        let version = version::read_current_version(Path::new("."), &config.sources)?;
        ui::display_success(&format!("Version OK: {}", version));
        return Ok(());
    }

    let git = Git2Backend::discover(".")?;
    let executor = ProcessExecutor;
    let mut machine = ReleaseStateMachine::new(&config, ".", &git, &executor);

    match args.command {
        Some(Commands::Feature { name }) => cmd_feature(&mut machine, &name),
        Some(Commands::Patch) => cmd_prepare(&mut machine, BumpKind::Patch, args.yes),
        Some(Commands::Minor) => cmd_prepare(&mut machine, BumpKind::Minor, args.yes),
        Some(Commands::Major) => cmd_prepare(&mut machine, BumpKind::Major, args.yes),
        Some(Commands::Publish) => cmd_publish(&mut machine),
        Some(Commands::FullRelease { kind }) => {
            cmd_full_release(&mut machine, kind.parse()?, args.yes)
        }
        Some(Commands::CheckVersion) => unreachable!("handled above"),
        None => interactive(&mut machine, &git, &config, args.yes),
    }
}

fn cmd_feature(machine: &mut ReleaseStateMachine, name: &str) -> Result<()> {
    ui::display_heading(&format!("Starting feature development: {}", name));
    machine.start_feature(name)?;
    ui::display_next_steps(&[
        "Implement your feature",
        "Test your changes",
        "Run: release-pilot <patch|minor|major> to prepare a release",
    ]);
    Ok(())
}

fn cmd_prepare(machine: &mut ReleaseStateMachine, kind: BumpKind, yes: bool) -> Result<()> {
    ui::display_heading(&format!("Preparing release: {}", kind));

    let (current, next) = machine.preview_bump(kind)?;
    if !yes && !ui::confirm_action(&format!("Update version from {} to {}?", current, next))? {
        println!("Release preparation cancelled.");
        return Ok(());
    }

    machine.prepare_release(kind)?;
    ui::display_next_steps(&[
        "Push your branch and create a PR",
        "After the PR is merged, run: release-pilot publish",
    ]);
    Ok(())
}

fn cmd_publish(machine: &mut ReleaseStateMachine) -> Result<()> {
    ui::display_heading("Creating release");
    let session = machine.create_release()?;
    if let Some(version) = session.to_version {
        ui::display_status(&format!(
            "CI will now run all checks and publish version {}",
            version
        ));
    }
    Ok(())
}

fn cmd_full_release(machine: &mut ReleaseStateMachine, kind: BumpKind, yes: bool) -> Result<()> {
    ui::display_heading(&format!("FULL RELEASE: {}", kind));
    ui::display_status("Warning: this creates a release immediately, without PR review");

    if !yes && !ui::confirm_action("Are you sure you want to proceed with a full release?")? {
        println!("Full release cancelled.");
        return Ok(());
    }

    machine.full_release(kind)?;
    Ok(())
}

fn interactive(
    machine: &mut ReleaseStateMachine,
    git: &Git2Backend,
    config: &Config,
    yes: bool,
) -> Result<()> {
    ui::display_heading("Release Pilot - interactive mode");

    let guard = RepositoryStateGuard::new(git, &config.remote);
    if let Ok(state) = guard.state() {
        ui::display_status(&format!(
            "On branch '{}' ({})",
            state.current_branch,
            if state.is_clean { "clean" } else { "dirty" }
        ));
    }

    let choice = ui::select_option(
        "What would you like to do?",
        &[
            "Start a new feature",
            "Prepare a release (patch/minor/major)",
            "Create release (after PR is merged)",
            "Show help and exit",
        ],
    )?;

    match choice {
        0 => {
            let name = ui::prompt_text("Enter feature name (e.g. 'add-auth-command')")?;
            if name.is_empty() {
                ui::display_error("Feature name is required");
                return Ok(());
            }
            cmd_feature(machine, &name)
        }
        1 => {
            let kind = match ui::select_option(
                "What type of release?",
                &[
                    "patch - bug fixes, small improvements (1.0.1 -> 1.0.2)",
                    "minor - new features, backwards compatible (1.0.1 -> 1.1.0)",
                    "major - breaking changes (1.0.1 -> 2.0.0)",
                ],
            )? {
                0 => BumpKind::Patch,
                1 => BumpKind::Minor,
                _ => BumpKind::Major,
            };
            cmd_prepare(machine, kind, yes)
        }
        2 => {
            if yes || ui::confirm_action("Are you on the default branch with your PR merged?")? {
                cmd_publish(machine)
            } else {
                ui::display_status("Merge your PR first, then run: release-pilot publish");
                Ok(())
            }
        }
        _ => {
            Args::command().print_help()?;
            Ok(())
        }
    }
}
