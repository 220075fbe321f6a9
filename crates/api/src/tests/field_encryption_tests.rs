// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use missions_domain::SocialSecurityNumber;

use crate::{FieldCipher, FieldEncryptionError, dev_field_key, parse_field_key};

#[test]
fn test_sealing_twice_gives_different_ciphertext() {
    let cipher: FieldCipher = FieldCipher::new(dev_field_key());

    let first: String = cipher.seal("123456789").unwrap();
    let second: String = cipher.seal("123456789").unwrap();

    assert_ne!(first, second);
    assert_eq!(cipher.open(&first).unwrap(), "123456789");
    assert_eq!(cipher.open(&second).unwrap(), "123456789");
}

#[test]
fn test_value_sealed_under_other_key_does_not_open() {
    let sealer: FieldCipher = FieldCipher::new([7u8; 32]);
    let opener: FieldCipher = FieldCipher::new([8u8; 32]);

    let sealed: String = sealer.seal("123456789").unwrap();

    assert!(matches!(
        opener.open(&sealed),
        Err(FieldEncryptionError::Open(_))
    ));
}

#[test]
fn test_tampered_ciphertext_is_rejected() {
    let cipher: FieldCipher = FieldCipher::new(dev_field_key());
    let mut sealed: Vec<u8> = hex::decode(cipher.seal("123456789").unwrap()).unwrap();
    let last: usize = sealed.len() - 1;
    sealed[last] ^= 0x01;

    assert!(cipher.open(&hex::encode(sealed)).is_err());
    assert!(cipher.open("abcd").is_err());
    assert!(cipher.open("not hex").is_err());
}

#[test]
fn test_masked_ssn_shows_last_four_digits() {
    let cipher: FieldCipher = FieldCipher::new(dev_field_key());
    let ssn: SocialSecurityNumber = SocialSecurityNumber::parse("987 65 4321").unwrap();

    let sealed: String = cipher.seal_ssn(&ssn).unwrap();

    assert_eq!(cipher.masked_ssn(&sealed).unwrap(), "***-**-4321");
}

#[test]
fn test_parse_field_key_accepts_64_hex_characters() {
    let key: [u8; 32] = parse_field_key(&"ab".repeat(32)).unwrap();
    assert_eq!(key, [0xab; 32]);

    assert!(matches!(
        parse_field_key("abcd"),
        Err(FieldEncryptionError::InvalidKeyLength(2))
    ));
    assert!(matches!(
        parse_field_key("zz"),
        Err(FieldEncryptionError::InvalidKeyHex(_))
    ));
}

#[test]
fn test_debug_output_hides_key() {
    let cipher: FieldCipher = FieldCipher::new([1u8; 32]);
    assert_eq!(format!("{cipher:?}"), "FieldCipher(..)");
}
