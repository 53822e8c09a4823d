use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use servolink_dispatch::{
    open_serial, DispatchConfig, LimitedActuator, LogActuator, ReceiverConfig,
};
use servolink_frame::Phase;
use servolink_transport::SerialConfig;
use tracing::info;

use crate::cmd::ListenArgs;
use crate::exit::{receive_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_event, print_stats, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = receiver_config(&args)?;
    let serial = SerialConfig {
        baud_rate: args.baud,
        ..SerialConfig::default()
    };
    let actuator = LimitedActuator::new(
        LogActuator::new(),
        args.limits.joint_limits(),
        args.limit_policy.into(),
    );

    let mut receiver = open_serial(&args.port, &serial, actuator, config)
        .map_err(|err| receive_error("open failed", err))?;
    info!(port = %args.port.display(), baud = args.baud, "listening");

    let stop = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(stop.clone())?;

    let stats = receiver
        .run_with(&stop, args.count, |event| print_event(event, format))
        .map_err(|err| receive_error("receive failed", err))?;

    let unterminated = receiver.reader().state().phase == Phase::Collecting;
    print_stats(&stats, unterminated, format);
    Ok(SUCCESS)
}

fn receiver_config(args: &ListenArgs) -> CliResult<ReceiverConfig> {
    Ok(ReceiverConfig {
        frame: args.frame.frame_config()?,
        dispatch: DispatchConfig {
            move_duration_ms: args.duration,
            echo: !args.no_echo,
        },
        reject_overflow: args.frame.reject_overflow,
        banner: (!args.no_banner).then(|| args.banner.clone()),
    })
}

fn install_ctrlc_handler(stop: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
