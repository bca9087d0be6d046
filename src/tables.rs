//! Character classification tables.
//!
//! Pure data. The tables are indexed by the raw input byte; classification
//! of a byte is a single load, which is what keeps the per-byte work of the
//! parser loop bounded.

macro_rules! byte_map {
    ($($flag:expr,)*) => ([
        $($flag != 0,)*
    ])
}

/// Header token characters per RFC 7230 `tchar`.
#[rustfmt::skip]
static TOKEN_MAP: [bool; 256] = byte_map![
//  \0                                             \a \b \t \n \v \f \r
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
//     !  "  #  $  %  &  '  (  )  *  +  ,  -  .  /
    0, 1, 0, 1, 1, 1, 1, 1, 0, 0, 1, 1, 0, 1, 1, 0,
//  0  1  2  3  4  5  6  7  8  9  :  ;  <  =  >  ?
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0,
//  @  A  B  C  D  E  F  G  H  I  J  K  L  M  N  O
    0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
//  P  Q  R  S  T  U  V  W  X  Y  Z  [  \  ]  ^  _
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 1, 1,
//  `  a  b  c  d  e  f  g  h  i  j  k  l  m  n  o
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
//  p  q  r  s  t  u  v  w  x  y  z  {  |  }  ~ del
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1, 0, 1, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Bytes that may appear in a url without any special meaning to the
/// request line scanner. `?` and `#` are excluded since they transition
/// between url parts; space, CR and LF terminate the url.
#[rustfmt::skip]
static URL_MAP: [bool; 256] = byte_map![
//  \0                                             \a \b \t \n \v \f \r
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
//     !  "  #  $  %  &  '  (  )  *  +  ,  -  .  /
    0, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
//  0  1  2  3  4  5  6  7  8  9  :  ;  <  =  >  ?
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0,
//  @  A  B  C  D  E  F  G  H  I  J  K  L  M  N  O
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
//  P  Q  R  S  T  U  V  W  X  Y  Z  [  \  ]  ^  _
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
//  `  a  b  c  d  e  f  g  h  i  j  k  l  m  n  o
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
//  p  q  r  s  t  u  v  w  x  y  z  {  |  }  ~ del
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Hex digit values, -1 for everything else.
#[rustfmt::skip]
static UNHEX: [i8; 256] = [
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
//   0  1  2  3  4  5  6  7   8  9
     0, 1, 2, 3, 4, 5, 6, 7,  8, 9,-1,-1,-1,-1,-1,-1,
//       A  B  C  D  E  F
    -1,10,11,12,13,14,15,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
//       a  b  c  d  e  f
    -1,10,11,12,13,14,15,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
    -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
];

/// Lowercase an ascii alpha byte, pass everything else through.
pub(crate) fn lower(b: u8) -> u8 {
    if b.is_ascii_uppercase() {
        b | 0x20
    } else {
        b
    }
}

/// The lowercased token character, or 0 if the byte is not a header token
/// character. In lenient mode a space also passes, which is what lets
/// trailing spaces after a header name through to the field matcher.
pub(crate) fn token(b: u8, strict: bool) -> u8 {
    if !strict && b == b' ' {
        return b' ';
    }
    if TOKEN_MAP[b as usize] {
        lower(b)
    } else {
        0
    }
}

pub(crate) fn unhex(b: u8) -> i8 {
    UNHEX[b as usize]
}

pub(crate) fn is_num(b: u8) -> bool {
    b.is_ascii_digit()
}

pub(crate) fn is_alpha(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

pub(crate) fn is_url_char(b: u8, strict: bool) -> bool {
    URL_MAP[b as usize] || (!strict && b & 0x80 != 0)
}

pub(crate) fn is_host_char(b: u8, strict: bool) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || (!strict && b == b'_')
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_lowercases() {
        assert_eq!(token(b'C', true), b'c');
        assert_eq!(token(b'-', true), b'-');
        assert_eq!(token(b':', true), 0);
        assert_eq!(token(b' ', true), 0);
        assert_eq!(token(b' ', false), b' ');
    }

    #[test]
    fn unhex_values() {
        assert_eq!(unhex(b'0'), 0);
        assert_eq!(unhex(b'9'), 9);
        assert_eq!(unhex(b'a'), 10);
        assert_eq!(unhex(b'F'), 15);
        assert_eq!(unhex(b'g'), -1);
        assert_eq!(unhex(b' '), -1);
    }

    #[test]
    fn url_chars() {
        assert!(is_url_char(b'/', true));
        assert!(is_url_char(b':', true));
        assert!(!is_url_char(b'?', true));
        assert!(!is_url_char(b'#', true));
        assert!(!is_url_char(b' ', true));
        assert!(!is_url_char(0xe5, true));
        assert!(is_url_char(0xe5, false));
    }

    #[test]
    fn host_chars() {
        assert!(is_host_char(b'x', true));
        assert!(is_host_char(b'-', true));
        assert!(!is_host_char(b'_', true));
        assert!(is_host_char(b'_', false));
        assert!(!is_host_char(b'/', false));
    }
}
