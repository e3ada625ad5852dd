//! # Test session
//!
//! In-memory FTP and SFTP servers, to test the operations without a real server

pub mod ftp;
pub mod sftp;

/// Remote file system shared by the sessions of an in-memory server
#[derive(Debug, Default)]
pub struct Tree {
    /// Directories and files, in creation order. The root directory is implicit.
    entries: Vec<(String, Node)>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Dir,
    File(Vec<u8>),
}

impl Tree {
    pub fn get(&self, path: &str) -> Option<&Node> {
        if path == "/" {
            return Some(&Node::Dir);
        }
        self.entries
            .iter()
            .find(|(entry, _)| entry == path)
            .map(|(_, node)| node)
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Node::Dir))
    }

    pub fn file(&self, path: &str) -> Option<&[u8]> {
        match self.get(path) {
            Some(Node::File(content)) => Some(content.as_slice()),
            _ => None,
        }
    }

    /// Create the directory at `path` along with its parents
    pub fn mkdir(&mut self, path: &str) {
        if path == "/" || self.is_dir(path) {
            return;
        }
        self.mkdir(&parent(path));
        self.entries.push((path.to_string(), Node::Dir));
    }

    /// Create or replace the file at `path`, creating its parents
    pub fn write(&mut self, path: &str, content: Vec<u8>) {
        self.mkdir(&parent(path));
        match self.entries.iter_mut().find(|(entry, _)| entry == path) {
            Some((_, node)) => *node = Node::File(content),
            None => self.entries.push((path.to_string(), Node::File(content))),
        }
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| entry != path);
        before != self.entries.len()
    }

    /// Entries directly in the directory `path`, in creation order
    pub fn children(&self, path: &str) -> Vec<(String, Node)> {
        self.entries
            .iter()
            .filter(|(entry, _)| parent(entry) == path)
            .map(|(entry, node)| (name(entry).to_string(), node.clone()))
            .collect()
    }
}

/// Absolute, normalized form of `path` relative to `cwd`
pub fn resolve(cwd: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{cwd}/{path}")
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

pub fn parent(path: &str) -> String {
    match path.rsplit_once('/') {
        Some(("", _)) | None => String::from("/"),
        Some((parent, _)) => parent.to_string(),
    }
}

fn name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_resolve_paths() {
        assert_eq!(resolve("/", "test/foo.txt").as_str(), "/test/foo.txt");
        assert_eq!(resolve("/test", "../bar.txt").as_str(), "/bar.txt");
        assert_eq!(resolve("/test", "/home/./x/").as_str(), "/home/x");
        assert_eq!(resolve("/", ".").as_str(), "/");
        assert_eq!(parent("/test/foo.txt").as_str(), "/test");
        assert_eq!(parent("/test").as_str(), "/");
    }

    #[test]
    fn should_build_tree() {
        let mut tree = Tree::default();
        tree.write("/test/foo.txt", b"foo.".to_vec());
        tree.write("/test/bar.txt", b"bar..".to_vec());
        assert!(tree.is_dir("/"));
        assert!(tree.is_dir("/test"));
        assert_eq!(tree.file("/test/foo.txt").unwrap(), b"foo.");
        let children: Vec<String> = tree
            .children("/test")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(children, vec![String::from("foo.txt"), String::from("bar.txt")]);
        assert!(tree.remove("/test/foo.txt"));
        assert!(!tree.remove("/test/foo.txt"));
    }
}
