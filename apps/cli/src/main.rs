//! gk-cli: ベンダーストア経由でインストールされたタイトルの一覧／検索／
//! ボリュームスキャン／起動／設定管理を行う管理用 CLI。

use clap::{Parser, Subcommand};
use gk_composition::domain::model::GameEntry;
use gk_composition::{DiscoveryUseCase, DomainError, StoreRuntime};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "gk-cli", about = "GameKompass store discovery CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// ストアのプラットフォーム機能が利用可能か表示
    Status {
        /// JSON形式で出力
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// レジストリ経路で解決した全タイトルを表示
    List {
        /// JSON形式で出力
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// ボリュームマーカー経路のスキャン結果を表示
    Volumes {
        /// JSON形式で出力
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// タイトルを検索
    Find {
        /// appId（複数指定可、最初の一致を返す）
        #[arg(long = "appid", num_args = 1..)]
        app_ids: Vec<String>,
        /// 表示名の正規表現パターン
        #[arg(long)]
        name: Option<String>,
        /// JSON形式で出力
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// タイトルを起動
    Launch {
        /// 対象のappId
        app_id: String,
    },
    /// スキャン設定の管理
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// 現在の設定を表示
    Show,
    /// スキャン対象のボリュームルートを設定（空で全ドライブ列挙に戻す）
    SetRoots {
        #[arg(num_args = 0..)]
        roots: Vec<String>,
    },
    /// 無視リストへ接頭辞を追加
    AddIgnore {
        #[arg(required = true, num_args = 1..)]
        prefixes: Vec<String>,
    },
}

/// JSON出力用のタイトル行
#[derive(Debug, Serialize)]
struct GameRow {
    app_id: String,
    publisher_id: String,
    execution_name: String,
    install_path: String,
    display_name: String,
    store_id: String,
    aumid: String,
}

impl From<&GameEntry> for GameRow {
    fn from(entry: &GameEntry) -> Self {
        Self {
            app_id: entry.app_id().to_string(),
            publisher_id: entry.publisher_id().to_string(),
            execution_name: entry.execution_name().to_string(),
            install_path: entry.install_path().to_string(),
            display_name: entry.display_name().to_string(),
            store_id: entry.store_id().to_string(),
            aumid: entry.aumid(),
        }
    }
}

fn print_entry(entry: &GameEntry) {
    println!("{}", entry.display_name());
    println!("  appId:     {}", entry.app_id());
    println!("  publisher: {}", entry.publisher_id());
    println!("  exec:      {}", entry.execution_name());
    println!("  install:   {}", entry.install_path());
    println!("  aumid:     {}", entry.aumid());
}

fn run(cli: Cli, runtime: &mut StoreRuntime) -> Result<(), DomainError> {
    match cli.command {
        Command::Status { json } => {
            let installed = runtime.provider().is_store_installed();
            if json {
                println!("{}", serde_json::json!({ "installed": installed }));
            } else if installed {
                println!("store: installed");
            } else {
                println!("store: not installed");
            }
        }
        Command::List { json } => {
            let entries = runtime.provider().all_games()?.to_vec();
            if json {
                let rows: Vec<GameRow> = entries.iter().map(GameRow::from).collect();
                println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
            } else if entries.is_empty() {
                println!("no titles found");
            } else {
                for entry in &entries {
                    print_entry(entry);
                }
            }
        }
        Command::Volumes { json } => {
            let games = runtime.provider().find_installed_games()?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&games).unwrap_or_default()
                );
            } else if games.is_empty() {
                println!("no titles found on any volume");
            } else {
                for (identity, install_path) in &games {
                    println!("{}  {}", identity, install_path);
                }
            }
        }
        Command::Find {
            app_ids,
            name,
            json,
        } => {
            let entry = match name {
                Some(pattern) => {
                    if !app_ids.is_empty() {
                        return Err(DomainError::InvalidArgument(
                            "--appid and --name are mutually exclusive".into(),
                        ));
                    }
                    runtime.provider().find_by_name(&pattern)?
                }
                None => runtime.provider().find_by_app_id(&app_ids)?,
            };
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&GameRow::from(&entry)).unwrap_or_default()
                );
            } else {
                print_entry(&entry);
            }
        }
        Command::Launch { app_id } => {
            runtime.provider().launch(Some(&app_id))?;
            println!("launched {}", app_id);
        }
        Command::Config { command } => match command {
            ConfigCommand::Show => {
                let config = runtime.load_config()?;
                println!("version:        {}", config.version);
                println!("volume roots:   {:?}", config.extra_volume_roots);
                println!("extra ignores:  {:?}", config.extra_ignore_prefixes);
            }
            ConfigCommand::SetRoots { roots } => {
                let mut config = runtime.load_config_or_default();
                config.extra_volume_roots = roots;
                runtime.save_config(&config)?;
                println!("saved {} volume root(s)", config.extra_volume_roots.len());
            }
            ConfigCommand::AddIgnore { prefixes } => {
                let mut config = runtime.load_config_or_default();
                config.extra_ignore_prefixes.extend(prefixes);
                config.ensure_defaults();
                runtime.save_config(&config)?;
                println!(
                    "ignore list now has {} extra prefix(es)",
                    config.extra_ignore_prefixes.len()
                );
            }
        },
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let mut runtime = StoreRuntime::new();
    let code = match run(cli, &mut runtime) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err);
            match err {
                DomainError::EntryNotFound { .. } => 1,
                _ => 2,
            }
        }
    };
    std::process::exit(code);
}
