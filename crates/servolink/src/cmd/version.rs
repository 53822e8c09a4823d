use serde::Serialize;
use servolink_frame::{DEFAULT_CAPACITY, DELIMITER, END_MARKER, FIELD_COUNT, START_MARKER};
use servolink_transport::DEFAULT_BAUD_RATE;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<BuildOutput>,
}

#[derive(Debug, Serialize)]
struct BuildOutput {
    target: &'static str,
    features: Vec<&'static str>,
    protocol: String,
}

fn build_info() -> BuildOutput {
    let mut features = vec!["cli", "dispatch"];
    if cfg!(feature = "async") {
        features.push("async");
    }
    BuildOutput {
        target: option_env!("SERVOLINK_BUILD_TARGET").unwrap_or("unknown"),
        features,
        protocol: format!(
            "{}name{}{FIELD_COUNT} ints{} capacity={DEFAULT_CAPACITY} baud={DEFAULT_BAUD_RATE}",
            START_MARKER as char, DELIMITER as char, END_MARKER as char
        ),
    }
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    let out = VersionOutput {
        name: "servolink",
        version: env!("CARGO_PKG_VERSION"),
        build: args.extended.then(build_info),
    };

    match (format, &out.build) {
        (OutputFormat::Json, _) => print_json(&out),
        (_, None) => println!("{} {}", out.name, out.version),
        (_, Some(build)) => {
            println!("name: {}", out.name);
            println!("version: {}", out.version);
            println!("target: {}", build.target);
            println!("features: {}", build.features.join(", "));
            println!("protocol: {}", build.protocol);
        }
    }
    Ok(SUCCESS)
}
