use msgess_frame::{DEFAULT_MAX_MESSAGE_SIZE, PROTOCOL_VERSION};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("msgess {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: msgess");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("protocol_version: {PROTOCOL_VERSION}");
    println!("default_max_message_size: {DEFAULT_MAX_MESSAGE_SIZE}");
    println!(
        "build_target: {}",
        option_env!("MSGESS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "transports: tcp{}",
        if cfg!(unix) { ", unix" } else { "" }
    );

    Ok(SUCCESS)
}
