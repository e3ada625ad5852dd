use std::path::PathBuf;

use argh::FromArgs;

#[derive(FromArgs)]
#[argh(description = "Transfer files from and to FTP and SFTP servers.

The endpoint is given as `ftp://[user@]host[:port]` or `sftp://[user@]host[:port]`")]
pub struct Args {
    #[argh(switch, short = 'D', description = "enable TRACE log level")]
    pub debug: bool,
    #[argh(switch, short = 'v', description = "verbose mode")]
    pub verbose: bool,
    #[argh(switch, short = 'V', description = "print version")]
    pub version: bool,
    #[argh(
        option,
        short = 'i',
        description = "private key used to authenticate on SFTP servers"
    )]
    pub identity: Option<PathBuf>,
    #[argh(
        option,
        description = "known hosts file used to verify SFTP servers (default: ~/.ssh/known_hosts)"
    )]
    pub known_hosts: Option<PathBuf>,
    #[argh(switch, description = "accept SFTP servers whose host key can't be verified")]
    pub insecure: bool,
    #[argh(positional, description = "endpoint to connect to")]
    pub endpoint: Option<String>,
}
