//! gangwaydict command line entry point
//!
//! カレントディレクトリの`GangwayDict.json`（存在する場合）から設定を読み込み、
//! リーフレットの生成を一度だけ実行します。

use env_logger::Env;
use log::{error, info};
use std::path::Path;
use std::process::ExitCode;

use gangwaydict::{GeneratorBuilder, GeneratorConfig, LeafletError, RunReport};

const CONFIG_FILE: &str = "GangwayDict.json";

fn run() -> Result<RunReport, LeafletError> {
    let config = if Path::new(CONFIG_FILE).exists() {
        info!("Using {}", CONFIG_FILE);
        GeneratorConfig::from_file(CONFIG_FILE)?
    } else {
        GeneratorConfig::default()
    };

    let mut generator = GeneratorBuilder::from_config(config).build()?;
    info!(
        "Spreadsheet {}, template {}",
        generator.config().spreadsheet.display(),
        generator.config().template.display()
    );
    generator.run()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run() {
        Ok(report) if report.is_success() => {
            info!("DONE");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            error!(
                "Finished with {} rendering and {} PDF failures",
                report.render_failures.len(),
                report.export_failures.len()
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e.trace());
            ExitCode::FAILURE
        }
    }
}
