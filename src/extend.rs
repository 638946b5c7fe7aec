use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

pub trait CutePath {
    /// path as shown to the user, forward slashes and no verbatim prefix
    fn cute_path(&self) -> String;
}

impl<P: AsRef<Path>> CutePath for P {
    fn cute_path(&self) -> String {
        let display = self.as_ref().display().to_string();
        display
            .strip_prefix(r"\\?\")
            .unwrap_or(&display)
            .replace('\\', "/")
    }
}

pub trait Blake3Path {
    fn get_blake3(&self) -> io::Result<String>;
}

impl<P: AsRef<Path>> Blake3Path for P {
    fn get_blake3(&self) -> io::Result<String> {
        let mut file = File::open(self.as_ref())?;
        read_blake3(&mut file)
    }
}

pub fn read_blake3<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    io::copy(reader, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}
