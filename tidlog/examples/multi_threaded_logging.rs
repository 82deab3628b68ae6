use std::sync::mpsc::channel;

use tidlog::{Identity, OutputKind, logger_config};

fn main() {
    // main thread logs to stdout only
    let logger = logger_config()
        .no_default_sinks()
        .start()
        .expect("Unable to start logger");
    let main_id = Identity::current();
    logger
        .add_output(main_id.clone(), OutputKind::Console, "", true)
        .unwrap();
    logger.add_log(&main_id, "Hello, world!");
    // threaded tasks log to their own text and CSV files
    let (handles, senders): (Vec<_>, Vec<_>) = (0..5)
        .map(|i| {
            let (sender, receiver) = channel::<&'static str>();
            let handle = logger.handle();
            (
                std::thread::spawn(move || {
                    let me = Identity::current();
                    let path = format!("/tmp/thread_{i}.log");
                    handle
                        .add_output(me.clone(), OutputKind::TextFile, &path, false)
                        .unwrap();
                    let path = format!("/tmp/thread_{i}.csv");
                    handle
                        .add_output(me.clone(), OutputKind::CsvFile, &path, false)
                        .unwrap();
                    for message in receiver {
                        handle.add_log(&me, format!("MESSAGE RECEIVED: {message}"));
                    }
                    handle.remove_thread_output(&me);
                }),
                sender,
            )
        })
        .unzip();
    for sender in senders {
        sender.send("Hello, world!").unwrap();
    }
    for handle in handles {
        handle.join().unwrap();
    }
    // waits for every thread's messages to be written
    logger.shutdown();
    for i in 0..5 {
        println!(
            "last line of /tmp/thread_{i}.log is:\n\t{}",
            std::fs::read_to_string(format!("/tmp/thread_{i}.log"))
                .unwrap()
                .trim_end()
                .lines()
                .last()
                .unwrap()
        );
    }
}
