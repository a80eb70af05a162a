//! Logix (CIP) symbolic address grammar.
//!
//! User tag:   `[Program:<name>.]<name>[idx]{.<name>[idx]}*[.<bit>]`
//! Module I/O: `<name>[:<slot>]:(I|O|C)[.<name>[idx]][.<bit>]`
//!
//! `<name>` starts with a letter or `_` + digit; underscores must be
//! followed by an alphanumeric. `[idx]` has one to three comma separated
//! dimensions. `<bit>` is one or two decimal digits and only ends an address.

use super::cursor::Cursor;
use super::{
    AddressError, GrammarLimits, IoDirection, Member, ModuleIoAddress, ParsedAddress,
    UserTagAddress,
};

const PROGRAM_PREFIX: &str = "Program:";
const MAX_ARRAY_DIMENSIONS: usize = 3;
const MAX_BIT_INDEX: u32 = 99;
const MAX_SLOT: u32 = 99;

/// Try the user-tag shape first, then module I/O. On failure the error of the
/// attempt that got further is reported.
pub(super) fn parse(text: &str, limits: &GrammarLimits) -> Result<ParsedAddress, AddressError> {
    let user_err = match parse_user_tag(text, limits) {
        Ok(address) => return Ok(ParsedAddress::UserTag(address)),
        Err(err) => err,
    };
    match parse_module_tag(text, limits) {
        Ok(address) => Ok(ParsedAddress::ModuleIo(address)),
        Err(module_err) => {
            if module_err.position() > user_err.position() {
                Err(module_err)
            } else {
                Err(user_err)
            }
        }
    }
}

pub(super) fn parse_user_tag(
    text: &str,
    limits: &GrammarLimits,
) -> Result<UserTagAddress, AddressError> {
    let mut cur = Cursor::new(text);

    let mut program = None;
    if has_prefix_ignore_case(cur.rest(), PROGRAM_PREFIX) {
        cur.skip(PROGRAM_PREFIX.len());
        program = Some(identifier(&mut cur)?.to_string());
        cur.expect(b'.', "'.' after program name")?;
    }

    let body_start = cur.position();
    let mut members = vec![member(&mut cur, limits)?];
    let mut bit = None;
    while cur.eat(b'.') {
        if cur.peek_is(|b| b.is_ascii_digit()) {
            bit = Some(bit_index(&mut cur)?);
            break;
        }
        members.push(member(&mut cur, limits)?);
    }
    cur.expect_end()?;

    Ok(UserTagAddress {
        program,
        local_name: text[body_start..].to_string(),
        members,
        bit,
    })
}

pub(super) fn parse_module_tag(
    text: &str,
    limits: &GrammarLimits,
) -> Result<ModuleIoAddress, AddressError> {
    let mut cur = Cursor::new(text);

    let module = identifier(&mut cur)?.to_string();
    cur.expect(b':', "':' after module name")?;

    let mut slot = None;
    if cur.peek_is(|b| b.is_ascii_digit()) {
        slot = Some(cur.number(2, MAX_SLOT)? as u8);
        cur.expect(b':', "':' after slot")?;
    }

    let direction = match cur.peek() {
        Some(b'I') => IoDirection::Input,
        Some(b'O') => IoDirection::Output,
        Some(b'C') => IoDirection::Config,
        _ => return Err(cur.error("direction I, O or C")),
    };
    cur.bump();

    let mut io_member = None;
    let mut bit = None;
    if cur.eat(b'.') {
        if cur.peek_is(|b| b.is_ascii_digit()) {
            bit = Some(bit_index(&mut cur)?);
        } else {
            io_member = Some(member(&mut cur, limits)?);
            if cur.eat(b'.') {
                bit = Some(bit_index(&mut cur)?);
            }
        }
    }
    cur.expect_end()?;

    Ok(ModuleIoAddress {
        module,
        slot,
        direction,
        member: io_member,
        bit,
    })
}

/// The identifier rule shared by program names, tag names, members and modules.
fn identifier<'a>(cur: &mut Cursor<'a>) -> Result<&'a str, AddressError> {
    let start = cur.position();
    match cur.peek() {
        Some(b) if b.is_ascii_alphabetic() => cur.bump(),
        Some(b'_') if cur.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => cur.skip(2),
        _ => return Err(cur.error("identifier")),
    }
    loop {
        match cur.peek() {
            Some(b) if b.is_ascii_alphanumeric() => cur.bump(),
            Some(b'_') if is_alnum(cur.peek_at(1)) => cur.skip(2),
            _ => break,
        }
    }
    Ok(cur.slice(start))
}

fn member(cur: &mut Cursor<'_>, limits: &GrammarLimits) -> Result<Member, AddressError> {
    let name = identifier(cur)?.to_string();
    let indices = array_index(cur, limits)?;
    Ok(Member { name, indices })
}

fn array_index(cur: &mut Cursor<'_>, limits: &GrammarLimits) -> Result<Vec<u32>, AddressError> {
    if !cur.eat(b'[') {
        return Ok(Vec::new());
    }
    let mut dims = vec![cur.number(usize::MAX, limits.max_array_index)?];
    while cur.eat(b',') {
        if dims.len() == MAX_ARRAY_DIMENSIONS {
            return Err(cur.error("at most three array dimensions"));
        }
        dims.push(cur.number(usize::MAX, limits.max_array_index)?);
    }
    cur.expect(b']', "']'")?;
    Ok(dims)
}

fn bit_index(cur: &mut Cursor<'_>) -> Result<u8, AddressError> {
    Ok(cur.number(2, MAX_BIT_INDEX)? as u8)
}

fn is_alnum(byte: Option<u8>) -> bool {
    byte.map(|b| b.is_ascii_alphanumeric()).unwrap_or(false)
}

fn has_prefix_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> GrammarLimits {
        GrammarLimits::default()
    }

    #[test]
    fn program_scoped_user_tag_parses_into_members() {
        let address = parse_user_tag("Program:MyProg.Tag1[3].Member[0].5", &limits()).unwrap();
        assert_eq!(address.program.as_deref(), Some("MyProg"));
        assert_eq!(address.local_name, "Tag1[3].Member[0].5");
        assert_eq!(
            address.members,
            vec![
                Member {
                    name: "Tag1".to_string(),
                    indices: vec![3]
                },
                Member {
                    name: "Member".to_string(),
                    indices: vec![0]
                },
            ]
        );
        assert_eq!(address.bit, Some(5));
    }

    #[test]
    fn identifier_rules() {
        for ok in ["Tag", "_1Tag", "_9", "Tag_1", "A_b_c", "x9"] {
            assert!(parse_user_tag(ok, &limits()).is_ok(), "{ok} should parse");
        }
        let bad_names = [
            "2BadStart", "_", "_a", "_Tag", "__a", "Tag__A", "Tag_", "Tag-1", "", "Täg",
        ];
        for bad in bad_names {
            assert!(parse_user_tag(bad, &limits()).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn array_dimensions_are_limited_to_three() {
        assert_eq!(
            parse_user_tag("Grid[1,2,3]", &limits()).unwrap().members[0].indices,
            vec![1, 2, 3]
        );
        assert!(parse_user_tag("Grid[1,2,3,4]", &limits()).is_err());
        assert!(parse_user_tag("Grid[]", &limits()).is_err());
        assert!(parse_user_tag("Grid[1,]", &limits()).is_err());
        assert!(parse_user_tag("Grid[1", &limits()).is_err());
    }

    #[test]
    fn array_index_above_limit_is_rejected_not_wrapped() {
        assert!(parse_user_tag("Big[2147483647]", &limits()).is_ok());
        assert_eq!(
            parse_user_tag("Big[2147483648]", &limits()).unwrap_err(),
            AddressError::IndexOutOfRange {
                position: 4,
                max: 2_147_483_647
            }
        );
        assert!(parse_user_tag("Big[99999999999999999999999]", &limits()).is_err());
    }

    #[test]
    fn bit_index_only_at_the_end_and_at_most_two_digits() {
        assert_eq!(parse_user_tag("Word.15", &limits()).unwrap().bit, Some(15));
        assert!(parse_user_tag("Word.100", &limits()).is_err());
        assert!(parse_user_tag("Word.1.2", &limits()).is_err());
        assert!(parse_user_tag("Word.1.Member", &limits()).is_err());
        assert!(parse_user_tag("Word.", &limits()).is_err());
    }

    #[test]
    fn program_prefix_is_case_insensitive() {
        let address = parse_user_tag("PROGRAM:Main.Counter", &limits()).unwrap();
        assert_eq!(address.program.as_deref(), Some("Main"));
        assert!(parse_user_tag("Program:.Counter", &limits()).is_err());
    }

    #[test]
    fn module_io_shapes() {
        let address = parse_module_tag("Local:1:I.Data.3", &limits()).unwrap();
        assert_eq!(address.module, "Local");
        assert_eq!(address.slot, Some(1));
        assert_eq!(address.direction, IoDirection::Input);
        assert_eq!(address.member.as_ref().map(|m| m.name.as_str()), Some("Data"));
        assert_eq!(address.bit, Some(3));

        let rack_optimized = parse_module_tag("Rack1:O", &limits()).unwrap();
        assert_eq!(rack_optimized.slot, None);
        assert_eq!(rack_optimized.direction, IoDirection::Output);

        assert!(parse_module_tag("Local:12:C.Ch[0]", &limits()).is_ok());
        assert!(parse_module_tag("Local:1:I.7", &limits()).is_ok());
        assert!(parse_module_tag("Local:1:X", &limits()).is_err());
        assert!(parse_module_tag("Local:123:I", &limits()).is_err());
        assert!(parse_module_tag("Local:1:I.Data.Sub", &limits()).is_err());
        assert!(parse_module_tag("Local:1:i", &limits()).is_err());
    }

    #[test]
    fn parse_falls_back_to_module_grammar() {
        assert!(matches!(
            parse("Local:2:O.Data", &limits()).unwrap(),
            ParsedAddress::ModuleIo(_)
        ));
        assert!(matches!(
            parse("Tag1.Sub", &limits()).unwrap(),
            ParsedAddress::UserTag(_)
        ));
    }

    #[test]
    fn reported_error_comes_from_the_further_attempt() {
        let err = parse("Local:1:Q", &limits()).unwrap_err();
        assert_eq!(
            err,
            AddressError::Syntax {
                position: 8,
                expected: "direction I, O or C"
            }
        );
    }
}
