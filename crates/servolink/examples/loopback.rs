//! Host and receiver joined by an in-process stream pair.
//!
//! Run with:
//!   cargo run --example loopback
//!
//! The receiver side is what a board runs: it moves a logging actuator and
//! echoes every command back. The host side sends a few frames (one of
//! them malformed) and prints what comes back.

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::io::{BufRead, BufReader, Write};
    use std::sync::atomic::AtomicBool;
    use std::thread;

    use servolink::dispatch::{EchoReporter, LogActuator, Receiver};
    use servolink::frame::CommandWriter;
    use servolink::transport::LinkStream;

    let (host, device) = LinkStream::pair()?;

    let echo = EchoReporter::new(device.try_clone()?);
    let board = thread::spawn(move || {
        let mut receiver = Receiver::new(device, LogActuator::new(), echo);
        receiver.run(&AtomicBool::new(false), None)
    });

    let mut lines = BufReader::new(host.try_clone()?).lines();
    let mut writer = CommandWriter::new(host);

    for (name, fields) in [
        ("Servo", [90, 45, 180, 180, 90, 10]),
        ("Servo", [0, 15, 0, 0, 0, 73]),
    ] {
        writer.send(name, &fields)?;
        for _ in 0..2 {
            if let Some(line) = lines.next() {
                println!("< {}", line?.trim_end());
            }
        }
    }

    // Too few fields: the receiver rejects it without moving.
    writer.get_mut().write_all(b"<Servo,1,2>")?;
    if let Some(line) = lines.next() {
        println!("< {}", line?.trim_end());
    }

    drop(writer);
    drop(lines);
    let stats = board.join().map_err(|_| "receiver thread panicked")??;
    println!(
        "frames={} dispatched={} rejected={}",
        stats.frames, stats.dispatched, stats.rejected
    );
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("the loopback example needs Unix stream pairs");
}
