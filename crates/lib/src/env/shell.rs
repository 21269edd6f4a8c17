//! Shell detection and export-script rendering

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Supported shell types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
  Bash,
  Zsh,
  Fish,
  PowerShell,
  Sh,
}

impl Shell {
  /// Detect the current shell from `$SHELL`, falling back to the platform default.
  pub fn detect() -> Self {
    if let Ok(shell) = env::var("SHELL") {
      let shell_name = PathBuf::from(&shell)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

      return shell_name.parse().unwrap_or(if shell_name.contains("zsh") {
        Shell::Zsh
      } else if shell_name.contains("bash") {
        Shell::Bash
      } else if shell_name.contains("fish") {
        Shell::Fish
      } else {
        Shell::Sh
      });
    }

    #[cfg(target_os = "windows")]
    return Shell::PowerShell;

    #[cfg(not(target_os = "windows"))]
    Shell::Sh
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Shell::Bash => "bash",
      Shell::Zsh => "zsh",
      Shell::Fish => "fish",
      Shell::PowerShell => "powershell",
      Shell::Sh => "sh",
    }
  }

  /// Quote `value` so the shell reads it back verbatim.
  pub fn quote(&self, value: &str) -> String {
    match self {
      Shell::PowerShell => format!("'{}'", value.replace('\'', "''")),
      Shell::Fish => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'")),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("'{}'", value.replace('\'', r"'\''")),
    }
  }

  /// Generate an export statement for setting an environment variable
  pub fn export_var(&self, name: &str, value: &str) -> String {
    let value = self.quote(value);
    match self {
      Shell::Fish => format!("set -gx {} {}", name, value),
      Shell::PowerShell => format!("$env:{} = {}", name, value),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("export {}={}", name, value),
    }
  }

  /// Generate a prepend statement for a PATH-like variable.
  ///
  /// `value` is already joined with the target's list separator.
  pub fn prepend_path(&self, name: &str, value: &str) -> String {
    let value = self.quote(value);
    match self {
      Shell::Fish => format!("set -gx {} {} ${}", name, value, name),
      Shell::PowerShell => format!(
        "$env:{} = {} + [IO.Path]::PathSeparator + $env:{}",
        name, value, name
      ),
      Shell::Bash | Shell::Zsh | Shell::Sh => {
        format!("export {}={}\"${{{}:+:${}}}\"", name, value, name, name)
      }
    }
  }

  pub fn comment(&self, text: &str) -> String {
    format!("# {}", text)
  }
}

impl FromStr for Shell {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "bash" => Ok(Shell::Bash),
      "zsh" => Ok(Shell::Zsh),
      "fish" => Ok(Shell::Fish),
      "sh" => Ok(Shell::Sh),
      "powershell" | "pwsh" => Ok(Shell::PowerShell),
      other => Err(format!(
        "unknown shell '{}' (supported: bash, zsh, fish, sh, powershell)",
        other
      )),
    }
  }
}

impl std::fmt::Display for Shell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn test_bash_export() {
    let export = Shell::Bash.export_var("RUST_SRC_PATH", "/store/rust-src/lib");
    assert_eq!(export, "export RUST_SRC_PATH='/store/rust-src/lib'");
  }

  #[test]
  fn test_fish_export() {
    let export = Shell::Fish.export_var("LD_LIBRARY_PATH", "/a/lib:/b/lib");
    assert_eq!(export, "set -gx LD_LIBRARY_PATH '/a/lib:/b/lib'");
  }

  #[test]
  fn test_powershell_export() {
    let export = Shell::PowerShell.export_var("RUST_SRC_PATH", r"C:\store\src");
    assert_eq!(export, r"$env:RUST_SRC_PATH = 'C:\store\src'");
  }

  #[test]
  fn posix_quoting_survives_single_quotes() {
    assert_eq!(Shell::Sh.quote("it's"), r"'it'\''s'");
    assert_eq!(Shell::PowerShell.quote("it's"), "'it''s'");
  }

  #[test]
  fn test_bash_prepend_path() {
    let prepend = Shell::Bash.prepend_path("PATH", "/store/cargo/bin");
    assert_eq!(prepend, r#"export PATH='/store/cargo/bin'"${PATH:+:$PATH}""#);
  }

  #[test]
  fn test_fish_prepend_path() {
    let prepend = Shell::Fish.prepend_path("PATH", "/store/cargo/bin");
    assert_eq!(prepend, "set -gx PATH '/store/cargo/bin' $PATH");
  }

  #[test]
  fn parse_accepts_pwsh_alias() {
    assert_eq!("pwsh".parse::<Shell>(), Ok(Shell::PowerShell));
    assert!("tcsh".parse::<Shell>().is_err());
  }

  #[test]
  #[serial]
  fn detect_reads_shell_variable() {
    temp_env::with_var("SHELL", Some("/usr/bin/zsh"), || {
      assert_eq!(Shell::detect(), Shell::Zsh);
    });
    temp_env::with_var("SHELL", Some("/opt/bin/bash5"), || {
      assert_eq!(Shell::detect(), Shell::Bash);
    });
  }
}
