use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Cat(String),
    DirExists(String),
    Exists(String),
    Get(String, PathBuf),
    GetAll(PathBuf, Vec<String>),
    Help,
    List(String),
    Put(PathBuf, String),
    Quit,
    Rm(String),
}

impl FromStr for Command {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split string by space
        let mut args = s.split_ascii_whitespace();
        // Match args
        match args.next() {
            Some(cmd) => match cmd.to_ascii_uppercase().as_str() {
                "CAT" => match args.next() {
                    Some(file) => Ok(Self::Cat(file.to_string())),
                    None => Err("Missing `file` field"),
                },
                "DIREXISTS" => match args.next() {
                    Some(dir) => Ok(Self::DirExists(dir.to_string())),
                    None => Err("Missing `dir` field"),
                },
                "EXISTS" => match args.next() {
                    Some(file) => Ok(Self::Exists(file.to_string())),
                    None => Err("Missing `file` field"),
                },
                "GET" => {
                    let file: String = match args.next() {
                        Some(f) => f.to_string(),
                        None => return Err("Missing `file` field"),
                    };
                    match args.next() {
                        Some(d) => Ok(Self::Get(file, PathBuf::from(d))),
                        None => Err("Missing `dest` field"),
                    }
                }
                "GETALL" => {
                    let dest: PathBuf = match args.next() {
                        Some(d) => PathBuf::from(d),
                        None => return Err("Missing `dest-dir` field"),
                    };
                    let files: Vec<String> = args.map(|f| f.to_string()).collect();
                    if files.is_empty() {
                        Err("Missing `file` field")
                    } else {
                        Ok(Self::GetAll(dest, files))
                    }
                }
                "HELP" => Ok(Self::Help),
                "LIST" => match args.next() {
                    Some(dir) => Ok(Self::List(dir.to_string())),
                    None => Ok(Self::List(String::from("."))),
                },
                "PUT" => {
                    let local: PathBuf = match args.next() {
                        Some(l) => PathBuf::from(l),
                        None => return Err("Missing `source` field"),
                    };
                    match args.next() {
                        Some(d) => Ok(Self::Put(local, d.to_string())),
                        None => Err("Missing `dest` field"),
                    }
                }
                "QUIT" => Ok(Self::Quit),
                "RM" => match args.next() {
                    Some(file) => Ok(Self::Rm(file.to_string())),
                    None => Err("Missing `file` field"),
                },
                _ => Err("Unknown command"),
            },
            None => Err("Unknown command"),
        }
    }
}
