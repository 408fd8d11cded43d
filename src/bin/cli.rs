//! Swctl command line interface.

use std::{net::IpAddr, process, time::Duration};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, App, AppSettings::*,
    Arg, ArgGroup, ArgMatches,
};
use console::style;
use log::{debug, trace, LevelFilter};
use simplelog::*;

use swctl::{self as sw, Settings};

fn main() {
    println!("[SW] swctl v{}", crate_version!());

    ctrlc::set_handler(move || {
        println!("🛑 received Ctrl+C!");
        process::exit(0);
    })
    .expect("Failed to install my Ctrl-C handler!");

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Swctl controls a switch through the relay feeding it and its \
            serial console. It can power the switch off, power cycle it, or \
            boot a firmware image over the console:\n\
               \t* power cycles the switch through the relay \n\
               \t* interrupts the boot countdown to enter debug mode \n\
               \t* pushes the baud-set helper with XMODEM and runs it \n\
               \t* pushes the firmware image with XMODEM and runs it \n\
            \n\
            Once the firmware runs, swctl becomes a simple terminal: any \
            input it gets from stdin is passed to the switch, and any data it \
            gets from the switch is printed to stdout.\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("PLUG")
                .help("IP address of the relay feeding the switch")
                .short("p")
                .long("plug")
                .takes_value(true)
                .required(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("DEVICE_TTY")
                .help("the serial device connected to the switch console")
                .short("t")
                .long("tty")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("BAUD_RATE")
                .help("serial port baud rate")
                .short("b")
                .long("baud-rate")
                .takes_value(true)
                .default_value("115200")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("UPLOAD_BAUD_RATE")
                .help("baud rate to switch to once the baud-set helper ran")
                .long("upload-baud-rate")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("IMAGE")
                .help("path to the firmware image to boot")
                .short("i")
                .long("image")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("BAUDSET")
                .help("path to the baud-set helper image")
                .long("baudset")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("ADDRESS")
                .help("address where the images are loaded")
                .short("a")
                .long("address")
                .takes_value(true)
                .default_value("0x81800000")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("PROMPT")
                .help("prompt of the switch boot monitor")
                .long("prompt")
                .takes_value(true)
                .default_value(sw::console_protocol::DEFAULT_PROMPT)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("TIMEOUT")
                .help("fail when the console stays silent for this many seconds")
                .long_help(
                    "fail when the console stays silent for this many seconds; \
                     when not set, swctl waits for the console forever.",
                )
                .long("timeout")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("POWEROFF")
                .help("power off the switch")
                .long("poweroff"),
        )
        .arg(
            Arg::with_name("REBOOT")
                .help("reboot the switch")
                .long("reboot"),
        )
        .arg(
            Arg::with_name("BOOT")
                .help("boot an image on the switch")
                .long("boot"),
        )
        .group(
            ArgGroup::with_name("ACTION")
                .args(&["POWEROFF", "REBOOT", "BOOT"])
                .required(true),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'swctl -v -v -v' or 'swctl -vvv' vs 'swctl -v'
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    trace!("{:#?}", matches);

    let settings = settings_from(&matches);
    debug!("{:#?}", settings);

    // Run the requested action ================================================

    let (phase, result) = if matches.is_present("POWEROFF") {
        println!("[SW] Powering off the switch");
        ("power off", sw::power_off(&settings))
    } else if matches.is_present("REBOOT") {
        println!("[SW] Rebooting the switch");
        ("reboot", sw::reboot(&settings))
    } else {
        ("boot", sw::boot(&settings))
    };

    if let Err(e) = result {
        println!("{} {}: {}", style("[SW] 💥").red(), style(phase).cyan(), e);
        process::exit(1);
    }
}

fn settings_from(matches: &ArgMatches) -> Settings {
    // Arguments with default values ===========================================

    // It's safe to call unwrap on all command line arguments with default
    // values, because the value with either be what the user input at runtime
    // or the default value

    let baud_rate = value_t!(matches.value_of("BAUD_RATE"), u32)
        .unwrap_or_else(|_| invalid_value("baud-rate", matches.value_of("BAUD_RATE").unwrap()));

    let address_arg = matches.value_of("ADDRESS").unwrap();
    let load_address =
        parse_address(address_arg).unwrap_or_else(|| invalid_value("address", address_arg));

    let plug = matches.value_of("PLUG").unwrap();
    if plug.parse::<IpAddr>().is_err() {
        invalid_value("plug", plug);
    }

    // END - Arguments with default values =====================================

    let mut builder = sw::SettingsBuilder::default()
        .plug(plug)
        .baud_rate(baud_rate)
        .load_address(load_address)
        .prompt(matches.value_of("PROMPT").unwrap());

    // START - Arguments with NO default values ================================

    if let Some(path) = matches.value_of("DEVICE_TTY") {
        builder = builder.path(path);
    }
    if let Some(image) = matches.value_of("IMAGE") {
        builder = builder.firmware_image(image);
    }
    if let Some(image) = matches.value_of("BAUDSET") {
        builder = builder.baudset_image(image);
    }
    if matches.is_present("UPLOAD_BAUD_RATE") {
        let rate = value_t!(matches.value_of("UPLOAD_BAUD_RATE"), u32).unwrap_or_else(|_| {
            invalid_value(
                "upload-baud-rate",
                matches.value_of("UPLOAD_BAUD_RATE").unwrap(),
            )
        });
        builder = builder.upload_baud_rate(rate);
    }
    if matches.is_present("TIMEOUT") {
        let secs = value_t!(matches.value_of("TIMEOUT"), u64)
            .unwrap_or_else(|_| invalid_value("timeout", matches.value_of("TIMEOUT").unwrap()));
        builder = builder.console_timeout(Duration::from_secs(secs));
    }

    // END - Arguments =========================================================

    builder.finalize()
}

/// Parse a load address, in hexadecimal with or without the `0x` prefix.
fn parse_address(value: &str) -> Option<u32> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(digits, 16).ok()
}

fn invalid_value(name: &str, value: &str) -> ! {
    println!(
        "{}: `{}` has an invalid value",
        style("error").red(),
        style(name).cyan()
    );
    println!(
        "   {} `{}` is not a valid value",
        style("-->").cyan(),
        style(value).on_red()
    );
    process::exit(-1);
}

#[test]
fn addresses_are_hexadecimal() {
    assert_eq!(parse_address("0x81800000"), Some(0x8180_0000));
    assert_eq!(parse_address("81800000"), Some(0x8180_0000));
    assert_eq!(parse_address("0X8000"), Some(0x8000));
    assert_eq!(parse_address("0xnope"), None);
    assert_eq!(parse_address("0x181800000"), None);
}
