use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use frontier::FileTransferClient;

pub fn exists(client: &dyn FileTransferClient, file: &str) {
    match client.file_exists(file) {
        Ok(true) => println!("{} exists", client.location_label(file)),
        Ok(false) => println!("{} does not exist", client.location_label(file)),
        Err(err) => eprintln!("EXISTS error: {}", err),
    }
}

pub fn dir_exists(client: &dyn FileTransferClient, dir: &str) {
    match client.dir_exists(dir) {
        Ok(true) => println!("{} exists", client.location_label(dir)),
        Ok(false) => println!("{} does not exist", client.location_label(dir)),
        Err(err) => eprintln!("DIREXISTS error: {}", err),
    }
}

pub fn cat(client: &dyn FileTransferClient, file: &str) {
    let mut stream = match client.stream(file) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("CAT error: {}", err);
            return;
        }
    };
    let mut stdout = io::stdout();
    if let Err(err) = io::copy(&mut stream, &mut stdout) {
        eprintln!("CAT error: {}", err);
    }
    let _ = stdout.flush();
    if let Err(err) = stream.close() {
        eprintln!("CAT error: {}", err);
    }
}

pub fn list(client: &dyn FileTransferClient, dir: &str) {
    match client.list(dir) {
        Ok(files) => files.iter().for_each(|f| println!("{}", f)),
        Err(err) => eprintln!("LIST error: {}", err),
    }
}

pub fn get(client: &dyn FileTransferClient, file: &str, dest: &Path) {
    match client.download_to_file(file, dest) {
        Ok(()) => println!("OK"),
        Err(err) => eprintln!("GET error: {}", err),
    }
}

pub fn get_all(client: &dyn FileTransferClient, dest: &Path, files: &[String]) {
    // open a local file for each remote file
    let mut sinks: Vec<(String, PathBuf, File)> = Vec::with_capacity(files.len());
    for file in files {
        let local = dest.join(remote_name(file));
        match File::create(&local) {
            Ok(f) => sinks.push((file.clone(), local, f)),
            Err(err) => {
                eprintln!("Failed to open {}: {}", local.display(), err);
                return;
            }
        }
    }
    let targets: BTreeMap<String, &mut dyn Write> = sinks
        .iter_mut()
        .map(|(file, _, f)| (file.clone(), f as &mut dyn Write))
        .collect();
    let outcome = client.download_all(targets);
    let downloaded = match outcome {
        Ok(downloaded) => downloaded,
        Err(err) => {
            eprintln!("GETALL error: {}", err);
            BTreeMap::new()
        }
    };
    for (file, local, _) in sinks.iter() {
        if downloaded.get(file).copied().unwrap_or(false) {
            println!("{} => {}", client.location_label(file), local.display());
        } else {
            eprintln!("{} was not downloaded", client.location_label(file));
            if let Err(err) = fs::remove_file(local) {
                warn!("failed to remove {}: {}", local.display(), err);
            }
        }
    }
}

pub fn put(client: &dyn FileTransferClient, source: &Path, dest: &str) {
    match client.upload_file(source, dest) {
        Ok(path) => println!("{}", client.location_label(&path)),
        Err(err) => eprintln!("PUT error: {}", err),
    }
}

pub fn rm(client: &dyn FileTransferClient, file: &str) {
    match client.delete(file) {
        Ok(()) => println!("OK"),
        Err(err) => eprintln!("RM error: {}", err),
    }
}

/// Last component of a remote path
fn remote_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}
