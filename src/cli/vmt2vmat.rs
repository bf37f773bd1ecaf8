use std::path::PathBuf;

use super::{Cli, CliRes};
use crate::config::parse_config;
use crate::modules::vmt2vmat::Vmt2Vmat;

pub struct Vmt2VmatCli;
impl Cli for Vmt2VmatCli {
    fn name(&self) -> &'static str {
        "vmt2vmat"
    }

    // In: content root or single .vmt, plus option flags
    fn cli(&self) -> CliRes {
        let args: Vec<String> = std::env::args().skip(2).collect();

        if args.is_empty() {
            self.cli_help();
            return CliRes::Err;
        }

        let config = match parse_config() {
            Ok(config) => config,
            Err(err) => {
                println!("Cannot parse config: {}", err);
                return CliRes::Err;
            }
        };

        let path = PathBuf::from(&args[0]);
        let mut module = Vmt2Vmat::new(&path);

        module
            .overwrite_vmat(config.overwrite_vmat.unwrap_or(true))
            .rename_textures(config.rename_textures.unwrap_or(true))
            .remove_vtf(config.remove_vtf.unwrap_or(false));

        for flag in &args[1..] {
            match flag.as_str() {
                "--no-overwrite" => {
                    module.overwrite_vmat(false);
                }
                "--no-rename" => {
                    module.rename_textures(false);
                }
                "--remove-vtf" => {
                    module.remove_vtf(true);
                }
                _ => {
                    println!("Unknown flag {}", flag);
                    self.cli_help();
                    return CliRes::Err;
                }
            }
        }

        match module.work() {
            Ok(summary) => {
                if summary.failures.is_empty() {
                    CliRes::Ok
                } else {
                    CliRes::Err
                }
            }
            Err(err) => {
                println!("{}", err);
                CliRes::Err
            }
        }
    }

    fn cli_help(&self) {
        println!(
            "\
Converts Source 1 .vmt materials into Source 2 .vmat

<content root or .vmt> [--no-overwrite] [--no-rename] [--remove-vtf]

--no-overwrite: keeps existing .vmat files
--no-rename: leaves texture files where they are
--remove-vtf: deletes .vtf files after conversion
"
        )
    }
}
