//! CLI parse tests.

use super::{CdArgs, CdPlusArgs};
use clap::Parser;

pub(super) fn parse_cd(args: &[&str]) -> CdArgs {
    CdArgs::try_parse_from(args).unwrap()
}

pub(super) fn parse_cd_plus(args: &[&str]) -> CdPlusArgs {
    CdPlusArgs::try_parse_from(args).unwrap()
}
