use std::path::PathBuf;

use super::{Cli, CliRes};
use crate::modules::mdl2vmdl::Mdl2Vmdl;

pub struct Mdl2VmdlCli;
impl Cli for Mdl2VmdlCli {
    fn name(&self) -> &'static str {
        "mdl2vmdl"
    }

    // In: content root holding models/
    fn cli(&self) -> CliRes {
        let args: Vec<String> = std::env::args().skip(2).collect();

        if args.is_empty() || args.len() > 2 {
            self.cli_help();
            return CliRes::Err;
        }

        let path = PathBuf::from(&args[0]);
        let mut module = Mdl2Vmdl::new(&path);

        if args.len() == 2 {
            if args[1] == "--overwrite" {
                module.overwrite(true);
            } else {
                self.cli_help();
                return CliRes::Err;
            }
        }

        if let Err(err) = module.work() {
            println!("{}", err);
            return CliRes::Err;
        }

        CliRes::Ok
    }

    fn cli_help(&self) {
        println!(
            "\
Writes .vmdl stubs next to legacy .mdl files

<content root> [--overwrite]
"
        )
    }
}
