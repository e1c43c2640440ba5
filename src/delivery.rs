use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Hands a finished document to the user.
pub trait Delivery: Send {
    fn deliver(&mut self, bytes: &[u8], file_name: &str) -> io::Result<()>;
}

/// Writes documents into a directory, creating it on first use.
///
/// A file with the same name is overwritten. Names must be a single path
/// component; anything that would land outside the directory is refused.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    dir: PathBuf,
    delivered: Vec<PathBuf>,
}

impl DirectoryDelivery {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        DirectoryDelivery {
            dir: dir.as_ref().to_path_buf(),
            delivered: Vec::new(),
        }
    }

    /// Paths written so far, in delivery order
    pub fn delivered(&self) -> &[PathBuf] {
        &self.delivered
    }
}

impl Delivery for DirectoryDelivery {
    fn deliver(&mut self, bytes: &[u8], file_name: &str) -> io::Result<()> {
        if !is_plain_file_name(file_name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{:?} is not a plain file name", file_name),
            ));
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        self.delivered.push(path);
        Ok(())
    }
}

fn is_plain_file_name(file_name: &str) -> bool {
    let mut components = Path::new(file_name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
