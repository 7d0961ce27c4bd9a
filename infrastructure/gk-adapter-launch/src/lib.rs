//! タイトル起動アダプター
//!
//! 組み立て済みのAUMIDをシェルのAppsFolder経由で起動する。
//! ドメインの `GameLauncher` ポートの実装。

use gk_domain::DomainError;
use gk_domain::port::driven::GameLauncher;

/// AppsFolderのシェルプレフィックス
pub const SHELL_APPS_FOLDER: &str = r"shell:AppsFolder\";

#[derive(Debug, Default, Clone)]
pub struct LaunchAdapter;

impl LaunchAdapter {
    pub fn new() -> Self {
        Self
    }
}

/// AUMIDから起動コマンド引数を組み立てる
pub fn shell_launch_argument(aumid: &str) -> String {
    format!("{}{}", SHELL_APPS_FOLDER, aumid)
}

impl GameLauncher for LaunchAdapter {
    #[cfg(windows)]
    fn launch_aumid(&self, aumid: &str) -> Result<(), DomainError> {
        use std::process::Command;

        // explorerに委譲するとアクティベーションの完了を待たずに戻れる
        Command::new("explorer.exe")
            .arg(shell_launch_argument(aumid))
            .spawn()
            .map_err(|err| DomainError::LaunchFailed(format!("{}: {}", aumid, err)))?;
        Ok(())
    }

    #[cfg(not(windows))]
    fn launch_aumid(&self, aumid: &str) -> Result<(), DomainError> {
        Err(DomainError::LaunchFailed(format!(
            "store activation is not supported on this platform: {}",
            aumid
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_argument_prefixes_aumid() {
        assert_eq!(
            shell_launch_argument("Publisher.Foo_pub!Game"),
            r"shell:AppsFolder\Publisher.Foo_pub!Game"
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn launch_is_unsupported_off_windows() {
        let adapter = LaunchAdapter::new();
        assert!(matches!(
            adapter.launch_aumid("Publisher.Foo_pub!App"),
            Err(DomainError::LaunchFailed(_))
        ));
    }
}
