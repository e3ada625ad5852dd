//! # Frontier Client
//!
//! This is a client you can install via `cargo install frontier-cli` on your system to work with
//! files on FTP and SFTP servers
//!

#[macro_use]
extern crate log;

// -- mods
mod actions;
mod args;
mod command;

use std::io::{self, Write};
use std::process::exit;
use std::str::FromStr;

use actions::*;
use args::Args;
use command::Command;
use env_logger::Builder as LogBuilder;
use frontier::{Endpoint, FileTransferClient, FtpClient, Protocol, SftpClient};
use log::LevelFilter;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

fn usage() {
    println!("Available commands:");
    println!("CAT <file>                          Print the content of `file`");
    println!("DIREXISTS <dir>                     Tell whether directory `dir` exists");
    println!("EXISTS <file>                       Tell whether `file` exists");
    println!("GET <file> <dest>                   Download `file` to local path `dest`");
    println!("GETALL <dest-dir> <file>...         Download every `file` into local directory `dest-dir`");
    println!("HELP                                Print this help");
    println!("LIST [dir]                          List files. If directory is not provided, current directory is used");
    println!("PUT <file> <dest>                   Upload local file `file` to `dest`");
    println!("QUIT                                Quit frontier");
    println!("RM <file>                           Remove file");
}

/// Read the next command. `None` once stdin is closed.
fn input() -> Option<Command> {
    loop {
        print!(">> ");
        let _ = io::stdout().flush();
        let mut input: String = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => return None,
            Ok(_) => {}
            Err(err) => {
                eprintln!("Failed to read stdin: {}", err);
                return None;
            }
        }
        match Command::from_str(input.as_str()) {
            Ok(cmd) => return Some(cmd),
            Err(err) => println!("{}", err),
        }
    }
}

fn prompt(question: &str) -> io::Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn make_client(args: &Args, endpoint: &Endpoint) -> io::Result<Box<dyn FileTransferClient>> {
    let username = match endpoint.username() {
        Some(username) => username.to_string(),
        None => prompt("Username: ")?,
    };
    match endpoint.protocol() {
        Protocol::Ftp => {
            let password = rpassword::prompt_password("Password: ")?;
            Ok(Box::new(FtpClient::new(
                endpoint.ftp_config(username, password),
            )))
        }
        Protocol::Sftp => {
            let mut config = endpoint.sftp_config(username);
            config = match args.identity.as_deref() {
                Some(key) => config.private_key(key),
                None => config.password(rpassword::prompt_password("Password: ")?),
            };
            if let Some(known_hosts) = args.known_hosts.as_deref() {
                config = config.known_hosts(known_hosts);
            }
            if args.insecure {
                config = config.insecure();
            }
            Ok(Box::new(SftpClient::new(config)))
        }
    }
}

fn main() {
    let args: Args = argh::from_env();
    // print version
    if args.version {
        println!("frontier {APP_VERSION} - developed by {APP_AUTHORS}");
        return;
    }
    // init logger
    LogBuilder::new()
        .filter_level(if args.debug {
            LevelFilter::Trace
        } else if args.verbose {
            LevelFilter::Info
        } else {
            LevelFilter::Off
        })
        .init();
    let endpoint: Endpoint = match args.endpoint.as_deref().map(Endpoint::from_str) {
        Some(Ok(endpoint)) => endpoint,
        Some(Err(err)) => {
            eprintln!("Bad endpoint: {}", err);
            exit(1);
        }
        None => {
            eprintln!("Missing endpoint; run `frontier --help` for usage");
            exit(1);
        }
    };
    let client = match make_client(&args, &endpoint) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("Failed to read credentials: {}", err);
            exit(1);
        }
    };
    // check credentials once before entering the loop
    if let Err(err) = client.dir_exists(".") {
        eprintln!("{}", err);
        exit(1);
    }
    info!("connected to {}", client.host_label());
    println!("OK");
    // Main loop
    while let Some(cmd) = input() {
        match cmd {
            Command::Quit => break,
            Command::Help => usage(),
            cmd => perform(client.as_ref(), cmd),
        }
    }
}

fn perform(client: &dyn FileTransferClient, command: Command) {
    match command {
        Command::Cat(file) => cat(client, file.as_str()),
        Command::DirExists(dir) => dir_exists(client, dir.as_str()),
        Command::Exists(file) => exists(client, file.as_str()),
        Command::Get(file, dest) => get(client, file.as_str(), dest.as_path()),
        Command::GetAll(dest, files) => get_all(client, dest.as_path(), files.as_slice()),
        Command::List(dir) => list(client, dir.as_str()),
        Command::Put(source, dest) => put(client, source.as_path(), dest.as_str()),
        Command::Rm(file) => rm(client, file.as_str()),
        Command::Help | Command::Quit => {}
    }
}
