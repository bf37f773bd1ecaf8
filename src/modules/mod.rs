pub mod mdl2vmdl;
pub mod vmt2vmat;
