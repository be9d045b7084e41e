use crate::error::{PhraseError, Result};
use chacha20::ChaCha20;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use rand::TryRngCore;
use rand::rngs::OsRng;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use zeroize::Zeroizing;

const KEYSTREAM_BLOCK: usize = 512;

/// A sequential stream of random bytes.
pub trait EntropySource {
    /// Fills `buf` completely or fails. Bytes are consumed strictly in order.
    fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<()>;
}

impl<S: EntropySource + ?Sized> EntropySource for &mut S {
    fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).fill_bytes(buf)
    }
}

impl<S: EntropySource + ?Sized> EntropySource for Box<S> {
    fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).fill_bytes(buf)
    }
}

/// The operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| PhraseError::EntropySource(io::Error::other(e)))
    }
}

/// Raw bytes from any reader, typically a random device.
///
/// Reads are unbuffered so that no more bytes are taken from the device
/// than the sampler asks for.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl ReaderSource<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        File::open(path)
            .map(Self::new)
            .map_err(PhraseError::EntropySource)
    }
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> EntropySource for ReaderSource<R> {
    fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader
            .read_exact(buf)
            .map_err(PhraseError::EntropySource)
    }
}

/// Deterministic ChaCha20 keystream, for reproducible output.
pub struct KeystreamSource {
    cipher: ChaCha20,
    buffer: Zeroizing<Vec<u8>>,
    pos: usize,
}

impl KeystreamSource {
    pub fn new(key: &[u8; 32]) -> Self {
        let mut cipher = ChaCha20::new(key.into(), &[0u8; 12].into());
        let mut buffer = Zeroizing::new(vec![0u8; KEYSTREAM_BLOCK]);
        cipher.apply_keystream(&mut buffer);

        Self {
            cipher,
            buffer,
            pos: 0,
        }
    }
}

impl EntropySource for KeystreamSource {
    fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        for byte in buf.iter_mut() {
            if self.pos >= self.buffer.len() {
                self.buffer.fill(0);
                self.cipher.apply_keystream(&mut self.buffer);
                self.pos = 0;
            }

            *byte = self.buffer[self.pos];
            self.pos += 1;
        }

        Ok(())
    }
}

type ReadResult = io::Result<Zeroizing<Vec<u8>>>;

/// Reads from a blocking source on a worker thread and gives up on any read
/// that takes longer than `timeout`.
///
/// After a timeout the source stays stalled: the late bytes would belong to
/// an abandoned draw, so every later read fails as well.
pub struct TimedSource {
    requests: Sender<usize>,
    responses: Receiver<ReadResult>,
    timeout: Duration,
    stalled: bool,
}

impl TimedSource {
    pub fn new<R: Read + Send + 'static>(mut reader: R, timeout: Duration) -> Result<Self> {
        let (requests, pending) = mpsc::channel::<usize>();
        let (finished, responses) = mpsc::channel::<ReadResult>();

        thread::Builder::new()
            .name("entropy-reader".to_string())
            .spawn(move || {
                for len in pending {
                    let mut buf = Zeroizing::new(vec![0u8; len]);
                    let result = reader.read_exact(&mut buf).map(|_| buf);
                    if finished.send(result).is_err() {
                        break;
                    }
                }
            })
            .map_err(PhraseError::EntropySource)?;

        Ok(Self {
            requests,
            responses,
            timeout,
            stalled: false,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl EntropySource for TimedSource {
    fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.stalled {
            return Err(PhraseError::EntropyTimeout(self.timeout));
        }

        if self.requests.send(buf.len()).is_err() {
            return Err(reader_gone());
        }

        match self.responses.recv_timeout(self.timeout) {
            Ok(Ok(bytes)) => {
                buf.copy_from_slice(&bytes);
                Ok(())
            }
            Ok(Err(e)) => Err(PhraseError::EntropySource(e)),
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("Entropy source stalled for {:?}", self.timeout);
                self.stalled = true;
                Err(PhraseError::EntropyTimeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(reader_gone()),
        }
    }
}

fn reader_gone() -> PhraseError {
    PhraseError::EntropySource(io::Error::new(
        io::ErrorKind::BrokenPipe,
        "entropy reader thread exited",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct StallingReader;

    impl Read for StallingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            thread::sleep(Duration::from_secs(30));
            Ok(0)
        }
    }

    #[test]
    fn test_reader_source_in_order() {
        let mut source = ReaderSource::new(Cursor::new(vec![1u8, 2, 3, 4, 5]));
        let mut buf = [0u8; 2];

        source.fill_bytes(&mut buf).unwrap();
        assert_eq!(buf, [1, 2]);
        source.fill_bytes(&mut buf).unwrap();
        assert_eq!(buf, [3, 4]);
    }

    #[test]
    fn test_reader_source_exhausted() {
        let mut source = ReaderSource::new(Cursor::new(vec![1u8]));
        let mut buf = [0u8; 2];

        let err = source.fill_bytes(&mut buf).unwrap_err();
        match err {
            PhraseError::EntropySource(e) => {
                assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof)
            }
            other => panic!("Unexpected error: {}", other),
        }
    }

    #[test]
    fn test_reader_source_missing_device() {
        let result = ReaderSource::open("/nonexistent/random/device");
        assert!(matches!(result, Err(PhraseError::EntropySource(_))));
    }

    #[test]
    fn test_keystream_deterministic() {
        let mut a = KeystreamSource::new(&[42u8; 32]);
        let mut b = KeystreamSource::new(&[42u8; 32]);
        let mut c = KeystreamSource::new(&[7u8; 32]);

        let mut buf_a = [0u8; 64];
        let mut buf_b = [0u8; 64];
        let mut buf_c = [0u8; 64];
        a.fill_bytes(&mut buf_a).unwrap();
        b.fill_bytes(&mut buf_b).unwrap();
        c.fill_bytes(&mut buf_c).unwrap();

        assert_eq!(buf_a, buf_b);
        assert_ne!(buf_a, buf_c);
    }

    #[test]
    fn test_keystream_chunking_is_transparent() {
        let mut whole = KeystreamSource::new(&[1u8; 32]);
        let mut chunked = KeystreamSource::new(&[1u8; 32]);

        let mut expected = vec![0u8; 3 * KEYSTREAM_BLOCK + 17];
        whole.fill_bytes(&mut expected).unwrap();

        let mut actual = Vec::new();
        let mut chunk = [0u8; 7];
        while actual.len() < expected.len() {
            chunked.fill_bytes(&mut chunk).unwrap();
            actual.extend_from_slice(&chunk);
        }

        assert_eq!(&actual[..expected.len()], expected.as_slice());
    }

    #[test]
    fn test_keystream_blocks_differ() {
        let mut source = KeystreamSource::new(&[9u8; 32]);
        let mut first = vec![0u8; KEYSTREAM_BLOCK];
        let mut second = vec![0u8; KEYSTREAM_BLOCK];
        source.fill_bytes(&mut first).unwrap();
        source.fill_bytes(&mut second).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_os_entropy() {
        let mut buf = [0u8; 32];
        OsEntropy.fill_bytes(&mut buf).unwrap();
        assert!(buf.iter().any(|&b| b != 0));
    }

    fn first_byte<S: EntropySource>(mut source: S) -> u8 {
        let mut buf = [0u8; 1];
        source.fill_bytes(&mut buf).unwrap();
        buf[0]
    }

    #[test]
    fn test_borrowed_and_boxed_sources() {
        let mut source = ReaderSource::new(Cursor::new(vec![5u8, 6, 7]));
        assert_eq!(first_byte(&mut source), 5);
        assert_eq!(first_byte(&mut source), 6);

        let boxed: Box<dyn EntropySource> = Box::new(source);
        assert_eq!(first_byte(boxed), 7);
    }

    #[test]
    fn test_timed_source_passes_bytes() {
        let mut source =
            TimedSource::new(Cursor::new(vec![10u8, 20, 30]), Duration::from_secs(5)).unwrap();
        let mut buf = [0u8; 3];
        source.fill_bytes(&mut buf).unwrap();
        assert_eq!(buf, [10, 20, 30]);

        let err = source.fill_bytes(&mut buf).unwrap_err();
        assert!(matches!(err, PhraseError::EntropySource(_)));
    }

    #[test]
    fn test_timed_source_times_out() {
        let timeout = Duration::from_millis(50);
        let mut source = TimedSource::new(StallingReader, timeout).unwrap();
        let mut buf = [0u8; 4];

        let err = source.fill_bytes(&mut buf).unwrap_err();
        assert!(matches!(err, PhraseError::EntropyTimeout(t) if t == timeout));

        let err = source.fill_bytes(&mut buf).unwrap_err();
        assert!(matches!(err, PhraseError::EntropyTimeout(_)));
    }
}
