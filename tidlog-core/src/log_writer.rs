use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{config::TIDLOG_CONFIG, error::Error};

pub trait LogWriter {
    fn write_line(&mut self, line: &str) -> Result<(), Error>;
    fn flush(&mut self) -> Result<(), Error>;
}

/// Kind of output requested through `add_output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Console,
    TextFile,
    CsvFile,
}

/// Opens `path` for logging, creating missing parent folders.
/// `append` keeps existing content, otherwise the file is truncated.
fn open_log_file(path: &Path, append: bool) -> Result<BufWriter<File>, Error> {
    let path_buf = path.to_path_buf();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(Some(&path_buf), e))?;
    }
    let file = File::options()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|e| Error::io(Some(&path_buf), e))?;
    Ok(BufWriter::new(file))
}

fn resolve_path(path: &str, default: &str) -> PathBuf {
    if path.is_empty() {
        PathBuf::from(default)
    } else {
        PathBuf::from(path)
    }
}

#[derive(Default, Debug)]
pub struct LogStdout;

impl LogWriter for LogStdout {
    fn write_line(&mut self, line: &str) -> Result<(), Error> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}")?;
        Ok(stdout.flush()?)
    }

    fn flush(&mut self) -> Result<(), Error> {
        Ok(io::stdout().flush()?)
    }
}

/// Plain-text log file, one line per message.
pub struct LogFile {
    path: PathBuf,
    file: BufWriter<File>,
}

impl LogFile {
    pub fn new<P: AsRef<Path>>(path: P, append: bool) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = open_log_file(&path, append)?;
        Ok(Self { path, file })
    }
}

impl LogWriter for LogFile {
    fn write_line(&mut self, line: &str) -> Result<(), Error> {
        writeln!(self.file, "{line}").map_err(|e| Error::io(Some(&self.path), e))
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.file.flush().map_err(|e| Error::io(Some(&self.path), e))
    }
}

/// Splits on `delimiter` the way `std::getline` does: a trailing delimiter
/// does not produce an empty last field.
fn split_fields(line: &str, delimiter: char) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(delimiter).collect();
    if line.ends_with(delimiter) {
        fields.pop();
    }
    fields
}

/// CSV log file. Each line is split on `-` and its first three fields are
/// written as one comma-separated row.
pub struct LogCsv {
    path: PathBuf,
    file: BufWriter<File>,
}

impl LogCsv {
    pub const DELIMITER: char = '-';
    pub const COLUMNS: usize = 3;

    pub fn new<P: AsRef<Path>>(path: P, append: bool) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = open_log_file(&path, append)?;
        Ok(Self { path, file })
    }
}

impl LogWriter for LogCsv {
    fn write_line(&mut self, line: &str) -> Result<(), Error> {
        let fields = split_fields(line, Self::DELIMITER);
        if fields.len() < Self::COLUMNS {
            return Err(Error::MalformedLogMessage {
                line: line.to_string(),
                fields: fields.len(),
            });
        }
        writeln!(self.file, "{}", fields[..Self::COLUMNS].join(","))
            .map_err(|e| Error::io(Some(&self.path), e))
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.file.flush().map_err(|e| Error::io(Some(&self.path), e))
    }
}

/// An output owned by the registry.
pub enum Sink {
    Console(LogStdout),
    TextFile(LogFile),
    CsvFile(LogCsv),
}

impl Sink {
    /// Builds a sink of the given kind. An empty `path` selects the
    /// configured default for file kinds and is ignored for the console.
    pub fn open(kind: OutputKind, path: &str, append: bool) -> Result<Self, Error> {
        Self::open_with_defaults(
            kind,
            path,
            append,
            &TIDLOG_CONFIG.TEXT_PATH,
            &TIDLOG_CONFIG.CSV_PATH,
        )
    }

    pub fn open_with_defaults(
        kind: OutputKind,
        path: &str,
        append: bool,
        text_default: &str,
        csv_default: &str,
    ) -> Result<Self, Error> {
        Ok(match kind {
            OutputKind::Console => Sink::Console(LogStdout),
            OutputKind::TextFile => {
                Sink::TextFile(LogFile::new(resolve_path(path, text_default), append)?)
            }
            OutputKind::CsvFile => {
                Sink::CsvFile(LogCsv::new(resolve_path(path, csv_default), append)?)
            }
        })
    }

}

impl LogWriter for Sink {
    fn write_line(&mut self, line: &str) -> Result<(), Error> {
        match self {
            Sink::Console(w) => w.write_line(line),
            Sink::TextFile(w) => w.write_line(line),
            Sink::CsvFile(w) => w.write_line(line),
        }
    }

    fn flush(&mut self) -> Result<(), Error> {
        match self {
            Sink::Console(w) => w.flush(),
            Sink::TextFile(w) => w.flush(),
            Sink::CsvFile(w) => w.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("tidlog_log_writer").join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_log_file_truncate_and_append() {
        let dir = test_dir("text_modes");
        let path = dir.join("nested").join("app.log");
        let mut file = LogFile::new(&path, false).unwrap();
        file.write_line("first").unwrap();
        file.flush().unwrap();
        drop(file);

        let mut file = LogFile::new(&path, true).unwrap();
        file.write_line("second").unwrap();
        drop(file);
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");

        let mut file = LogFile::new(&path, false).unwrap();
        file.write_line("third").unwrap();
        file.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "third\n");
    }

    #[test]
    fn test_csv_row() {
        let dir = test_dir("csv_row");
        let path = dir.join("app.csv");
        let mut csv = LogCsv::new(&path, false).unwrap();
        csv.write_line("a-b-c").unwrap();
        csv.write_line("x-y-z-extra").unwrap();
        csv.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b,c\nx,y,z\n");
    }

    #[test]
    fn test_csv_formatted_line() {
        let dir = test_dir("csv_formatted");
        let path = dir.join("app.csv");
        let mut csv = LogCsv::new(&path, false).unwrap();
        csv.write_line("[Mon Oct 19 09:05:03 2026] - [t1]\t- hello").unwrap();
        csv.flush().unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[Mon Oct 19 09:05:03 2026] , [t1]\t, hello\n"
        );
    }

    #[test]
    fn test_csv_malformed_is_dropped() {
        let dir = test_dir("csv_malformed");
        let path = dir.join("app.csv");
        let mut csv = LogCsv::new(&path, false).unwrap();
        for line in ["a-b", "a-b-", "", "no delimiter"] {
            match csv.write_line(line) {
                Err(Error::MalformedLogMessage { line: l, fields }) => {
                    assert_eq!(l, line);
                    assert!(fields < LogCsv::COLUMNS);
                }
                other => panic!("expected malformed error, got {other:?}"),
            }
        }
        csv.write_line("a--c").unwrap();
        csv.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,,c\n");
    }

    #[test]
    fn test_sink_default_paths() {
        let dir = test_dir("defaults");
        let text_default = dir.join("log.txt");
        let csv_default = dir.join("log.csv");
        let (text_default, csv_default) = (
            text_default.to_str().unwrap(),
            csv_default.to_str().unwrap(),
        );
        let mut text =
            Sink::open_with_defaults(OutputKind::TextFile, "", true, text_default, csv_default)
                .unwrap();
        let mut csv =
            Sink::open_with_defaults(OutputKind::CsvFile, "", true, text_default, csv_default)
                .unwrap();
        assert!(matches!(text, Sink::TextFile(_)));
        assert!(matches!(csv, Sink::CsvFile(_)));
        text.write_line("plain").unwrap();
        csv.write_line("1-2-3").unwrap();
        text.flush().unwrap();
        csv.flush().unwrap();
        assert_eq!(fs::read_to_string(text_default).unwrap(), "plain\n");
        assert_eq!(fs::read_to_string(csv_default).unwrap(), "1,2,3\n");
    }

    #[test]
    fn test_open_failure_reports_path() {
        let dir = test_dir("open_failure");
        fs::create_dir_all(&dir).unwrap();
        // a directory cannot be opened as a log file
        match LogFile::new(&dir, true) {
            Err(Error::Io { path, .. }) => assert_eq!(path.as_deref(), Some(dir.as_path())),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("opening a directory should fail"),
        }
    }

    #[test]
    fn test_log_stdout() {
        let mut sink = Sink::open(OutputKind::Console, "", true).unwrap();
        assert!(matches!(sink, Sink::Console(_)));
        sink.write_line("Hello, world!").unwrap();
        sink.flush().unwrap();
    }
}
