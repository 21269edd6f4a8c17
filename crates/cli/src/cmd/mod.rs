mod build;
mod check;
mod env;
mod info;
mod init;
mod shell;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use devshell_lib::consts::INDEX_FILE;
use devshell_lib::env::{Environment, assemble};
use devshell_lib::manifest::{ProjectManifest, Toolchain};
use devshell_lib::platform::Platform;
use devshell_lib::resolve::PackageIndex;

pub use build::cmd_build;
pub use check::cmd_check;
pub use env::cmd_env;
pub use info::cmd_info;
pub use init::cmd_init;
pub use shell::cmd_shell;

/// Where the project files live, as given on the command line.
pub struct ProjectArgs {
  pub file: PathBuf,
  pub index: Option<PathBuf>,
}

/// A loaded manifest and the package index it resolves against.
pub struct Project {
  pub root: PathBuf,
  pub manifest: ProjectManifest,
  pub index: PackageIndex,
}

impl Project {
  pub fn load(args: &ProjectArgs) -> Result<Self> {
    let manifest_path = dunce::canonicalize(&args.file)
      .with_context(|| format!("Failed to locate manifest {}", args.file.display()))?;
    let root = manifest_path
      .parent()
      .map(Path::to_path_buf)
      .context("Manifest has no parent directory")?;

    let manifest = ProjectManifest::load(&manifest_path)?;

    let index_path = args.index.clone().unwrap_or_else(|| root.join(INDEX_FILE));
    let index = PackageIndex::load(&index_path).context("Failed to load package index")?;

    debug!(manifest = %manifest_path.display(), index = %index_path.display(), "loaded project");
    Ok(Self { root, manifest, index })
  }

  /// The index to resolve `platform` with. Store paths of other hosts are
  /// not checked on disk.
  pub fn resolver_for(&self, platform: Platform) -> PackageIndex {
    if Platform::current() == Some(platform) {
      self.index.clone()
    } else {
      self.index.clone().trusting_paths()
    }
  }

  pub fn assemble(&self, platform: Platform) -> Result<Environment> {
    self.assemble_with(&self.manifest.toolchain, platform)
  }

  /// Assemble without interactive tools, which a build never puts on `PATH`.
  pub fn assemble_for_build(&self, platform: Platform) -> Result<Environment> {
    self.assemble_with(&self.manifest.toolchain.for_build(), platform)
  }

  fn assemble_with(&self, toolchain: &Toolchain, platform: Platform) -> Result<Environment> {
    let resolver = self.resolver_for(platform);
    assemble(&self.manifest.dependencies, toolchain, platform, &resolver)
      .with_context(|| format!("Failed to assemble environment for {}", platform))
  }
}

/// The requested platform, or the host's.
pub fn target_platform(requested: Option<Platform>) -> Result<Platform> {
  match requested.or_else(Platform::current) {
    Some(platform) => Ok(platform),
    None => bail!("Unsupported host platform; pass --platform"),
  }
}

/// Like [`target_platform`], but the result must be runnable here.
pub fn host_platform(requested: Option<Platform>) -> Result<Platform> {
  let platform = target_platform(requested)?;
  if Platform::current() != Some(platform) {
    bail!("Cannot run {} binaries on this host", platform);
  }
  Ok(platform)
}
