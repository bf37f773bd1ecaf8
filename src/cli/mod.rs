use self::{mdl2vmdl::Mdl2VmdlCli, vmt2vmat::Vmt2VmatCli};

mod mdl2vmdl;
mod vmt2vmat;

pub enum CliRes {
    NoCli,
    Ok,
    Err,
}

pub trait Cli {
    fn name(&self) -> &'static str;
    /// `args[1]` is the name of the module.
    ///
    /// Arguments for the module start at `args[2]`.
    fn cli(&self) -> CliRes;
    fn cli_help(&self);
}

pub fn cli() -> CliRes {
    let args: Vec<String> = std::env::args().collect();

    // Add new modules here.
    let modules: &[&dyn Cli] = &[&Vmt2VmatCli, &Mdl2VmdlCli];

    let help = || {
        println!(
            "\
source2util

Available modules:"
        );
        for module in modules {
            println!("{}", module.name());
        }
    };

    if args.len() < 2 {
        help();
        return CliRes::NoCli;
    }

    for module in modules {
        if args[1] == module.name() {
            return module.cli();
        }
    }

    // In case nothing fits then prints this again.
    help();

    CliRes::Err
}
