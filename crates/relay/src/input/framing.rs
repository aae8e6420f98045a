//! RFC 6587 TCP 프레이밍 디코더
//!
//! 프레임마다 첫 바이트로 프레이밍을 자동 감지합니다:
//!
//! - ASCII 숫자로 시작하면 octet-counting (`MSG-LEN SP MESSAGE`)
//! - 그 외에는 non-transparent (단일 LF 종료, CR 허용)
//!
//! 길이 자릿수는 최대 [`MAX_OCTET_DIGITS`]로 제한하여 무한 버퍼링을
//! 방지합니다. 프레이밍 에러는 해당 연결을 닫는 신호입니다.

use bytes::{Buf, Bytes, BytesMut};

/// octet-counting 길이 필드의 최대 자릿수
pub const MAX_OCTET_DIGITS: usize = 10;

/// 프레이밍 에러 — 발생 시 해당 TCP 연결을 닫습니다.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    /// 길이 자릿수가 한도를 초과함
    #[error("octet count digit run exceeds {MAX_OCTET_DIGITS} digits")]
    OverlongDigitRun,

    /// 길이 필드 뒤에 공백이 없거나 값이 비정상
    #[error("invalid octet count: {0}")]
    InvalidLength(String),

    /// 프레임이 메시지 최대 크기를 초과함
    #[error("frame of {size} bytes exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },
}

/// 수신 바이트를 누적하며 완성된 프레임을 꺼내는 디코더
///
/// 소켓 없이 단위 테스트할 수 있도록 순수 상태 기계로 분리되어 있습니다.
pub struct FrameDecoder {
    buf: BytesMut,
    max_frame_size: usize,
}

impl FrameDecoder {
    /// 프레임당 최대 크기를 지정하여 새 디코더를 생성합니다.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame_size,
        }
    }

    /// 소켓에서 읽은 바이트를 버퍼에 추가합니다.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// 완성된 다음 프레임을 반환합니다.
    ///
    /// `Ok(None)`은 데이터가 더 필요하다는 뜻입니다. 빈 프레임
    /// (연속된 개행)은 건너뜁니다.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, FramingError> {
        loop {
            if self.buf.is_empty() {
                return Ok(None);
            }

            let frame = if self.buf[0].is_ascii_digit() {
                self.next_octet_counted()?
            } else {
                self.next_line()?
            };

            match frame {
                Some(frame) if frame.is_empty() => continue,
                other => return Ok(other),
            }
        }
    }

    /// `MSG-LEN SP MESSAGE` 프레임을 추출합니다.
    fn next_octet_counted(&mut self) -> Result<Option<Bytes>, FramingError> {
        let digit_end = self
            .buf
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(self.buf.len());

        if digit_end > MAX_OCTET_DIGITS {
            return Err(FramingError::OverlongDigitRun);
        }
        if digit_end == self.buf.len() {
            // 길이 필드가 아직 다 도착하지 않음
            return Ok(None);
        }
        if self.buf[digit_end] != b' ' {
            return Err(FramingError::InvalidLength(format!(
                "expected space after length, got 0x{:02x}",
                self.buf[digit_end]
            )));
        }

        let digits = std::str::from_utf8(&self.buf[..digit_end])
            .map_err(|_| FramingError::InvalidLength("non-ascii length".to_owned()))?;
        let len: usize = digits
            .parse()
            .map_err(|_| FramingError::InvalidLength(digits.to_owned()))?;

        if len > self.max_frame_size {
            return Err(FramingError::FrameTooLarge {
                size: len,
                max: self.max_frame_size,
            });
        }

        let frame_start = digit_end + 1;
        if self.buf.len() < frame_start + len {
            return Ok(None);
        }

        self.buf.advance(frame_start);
        Ok(Some(self.buf.split_to(len).freeze()))
    }

    /// LF로 끝나는 non-transparent 프레임을 추출합니다.
    fn next_line(&mut self) -> Result<Option<Bytes>, FramingError> {
        let Some(lf) = self.buf.iter().position(|b| *b == b'\n') else {
            if self.buf.len() > self.max_frame_size {
                return Err(FramingError::FrameTooLarge {
                    size: self.buf.len(),
                    max: self.max_frame_size,
                });
            }
            return Ok(None);
        };

        if lf > self.max_frame_size {
            return Err(FramingError::FrameTooLarge {
                size: lf,
                max: self.max_frame_size,
            });
        }

        let mut frame = self.buf.split_to(lf).freeze();
        self.buf.advance(1); // LF 소비

        // CR은 양쪽 모두 허용하고 제거
        if frame.last() == Some(&b'\r') {
            frame.truncate(frame.len() - 1);
        }
        if frame.first() == Some(&b'\r') {
            frame.advance(1);
        }

        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut FrameDecoder) -> Vec<Bytes> {
        let mut frames = Vec::new();
        while let Ok(Some(frame)) = decoder.next_frame() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn octet_counted_frames() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"12 <13>hi there7 <13>bye");
        let frames = decode_all(&mut decoder);
        assert_eq!(frames, vec![&b"<13>hi there"[..], &b"<13>bye"[..]]);
    }

    #[test]
    fn newline_delimited_frames() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"<13>one\n<13>two\n");
        let frames = decode_all(&mut decoder);
        assert_eq!(frames, vec![&b"<13>one"[..], &b"<13>two"[..]]);
    }

    #[test]
    fn crlf_is_tolerated() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"<13>one\r\n\r<13>two\n");
        let frames = decode_all(&mut decoder);
        assert_eq!(frames, vec![&b"<13>one"[..], &b"<13>two"[..]]);
    }

    #[test]
    fn framings_can_alternate_per_frame() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"7 <13>abc<13>line\n");
        let frames = decode_all(&mut decoder);
        assert_eq!(frames, vec![&b"<13>abc"[..], &b"<13>line"[..]]);
    }

    #[test]
    fn partial_frames_wait_for_more_data() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"12 <13>hi");
        assert_eq!(decoder.next_frame().unwrap(), None);
        decoder.extend(b" there");
        assert_eq!(decoder.next_frame().unwrap().unwrap(), &b"<13>hi there"[..]);
    }

    #[test]
    fn partial_length_field_waits() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"12");
        assert_eq!(decoder.next_frame().unwrap(), None);
        decoder.extend(b" <13>hi there");
        assert!(decoder.next_frame().unwrap().is_some());
    }

    #[test]
    fn digit_run_longer_than_ten_closes_connection() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"12345678901 hello");
        assert_eq!(
            decoder.next_frame().unwrap_err(),
            FramingError::OverlongDigitRun
        );
    }

    #[test]
    fn digits_without_space_are_invalid() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"123<13>msg");
        assert!(matches!(
            decoder.next_frame().unwrap_err(),
            FramingError::InvalidLength(_)
        ));
    }

    #[test]
    fn oversized_octet_count_rejected() {
        let mut decoder = FrameDecoder::new(16);
        decoder.extend(b"1000 x");
        assert!(matches!(
            decoder.next_frame().unwrap_err(),
            FramingError::FrameTooLarge { .. }
        ));
    }

    #[test]
    fn oversized_line_rejected() {
        let mut decoder = FrameDecoder::new(8);
        decoder.extend(b"<13>this line is far too long");
        assert!(matches!(
            decoder.next_frame().unwrap_err(),
            FramingError::FrameTooLarge { .. }
        ));
    }

    #[test]
    fn empty_lines_are_skipped() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"\n\n<13>real\n");
        let frames = decode_all(&mut decoder);
        assert_eq!(frames, vec![&b"<13>real"[..]]);
    }

    #[test]
    fn zero_length_octet_frame_is_skipped() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"0 5 <13>x");
        let frames = decode_all(&mut decoder);
        assert_eq!(frames, vec![&b"<13>x"[..]]);
    }
}
