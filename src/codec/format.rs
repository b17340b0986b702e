//! Packed rule records.
//!
//! ## Layout
//!
//! ```text
//! byte 0: rule type (4) | rule arg (4)
//! byte 1: symmetry (4)  | when-do count (4)
//! per when-do:
//!   col (4) | row (4)
//!   ceil(B/4) bytes background predicate
//!   ceil(S/4) bytes sprite predicate
//!   direction (4) | command count (4)
//! per command, grouped by when-do in record order:
//!   instruction (8) | argument (8)
//! ```
//!
//! `B` and `S` are the project's background and sprite kind counts. They are
//! not stored in the record and must match between `pack` and `unpack`.
//!
//! Entries that constrain nothing and carry no commands are dropped on
//! `pack`, so `unpack(pack(r))` equals `r` minus those entries.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::core::{FormatError, FormatResult, KindCounts};
use crate::rules::{
    packed_len, Command, CommandType, Coord, Direction, Predicate, Rule, RuleType, Symmetry,
    WhenDo, MAX_COMMANDS, MAX_WHEN_DOS,
};

use super::cursor::BitCursor;

/// Header bytes before the first when-do record.
pub const HEADER_LEN: usize = 2;

/// Bytes per command.
pub const COMMAND_LEN: usize = 2;

/// Size of one when-do record, commands excluded.
#[must_use]
pub const fn when_do_len(kinds: KindCounts) -> usize {
    2 + packed_len(kinds.backgrounds) + packed_len(kinds.sprites)
}

fn retained(rule: &Rule) -> impl Iterator<Item = &WhenDo> + '_ {
    rule.when_dos.iter().filter(|wd| !wd.is_no_op())
}

/// Exact size of `pack(rule, kinds)`.
#[must_use]
pub fn packed_size(rule: &Rule, kinds: KindCounts) -> usize {
    HEADER_LEN
        + retained(rule)
            .map(|wd| when_do_len(kinds) + COMMAND_LEN * wd.commands.len())
            .sum::<usize>()
}

/// Encode `rule` for a project with the given kind counts.
///
/// Panics if the rule breaks a format ceiling: more than `MAX_WHEN_DOS`
/// retained entries, more than `MAX_COMMANDS` commands in one entry, a
/// coordinate outside the window, or predicates sized for other counts.
#[must_use]
pub fn pack(rule: &Rule, kinds: KindCounts) -> Vec<u8> {
    let entries: SmallVec<[&WhenDo; MAX_WHEN_DOS]> = retained(rule).collect();
    assert!(
        entries.len() <= MAX_WHEN_DOS,
        "rule has {} when-dos, format holds {MAX_WHEN_DOS}",
        entries.len()
    );

    let size = packed_size(rule, kinds);
    let mut cursor = BitCursor::new(vec![0u8; size]);

    cursor.write_field(rule.rule_type.bits(), 4);
    cursor.write_field(rule.rule_arg, 4);
    cursor.write_field(rule.symmetry.bits(), 4);
    cursor.write_field(entries.len() as u8, 4);

    for wd in &entries {
        assert!(wd.coord.in_window(), "when-do at {} outside the window", wd.coord);
        assert!(
            wd.fits(kinds),
            "when-do at {} sized for {}/{} kinds, project has {}/{}",
            wd.coord,
            wd.background.len(),
            wd.sprites.len(),
            kinds.backgrounds,
            kinds.sprites
        );
        assert!(
            wd.commands.len() <= MAX_COMMANDS,
            "when-do at {} has {} commands",
            wd.coord,
            wd.commands.len()
        );
        cursor.write_field(wd.coord.col, 4);
        cursor.write_field(wd.coord.row, 4);
        cursor.write_raw(wd.background.as_bytes());
        cursor.write_raw(wd.sprites.as_bytes());
        cursor.write_field(wd.direction.bits(), 4);
        cursor.write_field(wd.commands.len() as u8, 4);
    }

    for wd in entries.iter().filter(|wd| !wd.commands.is_empty()) {
        for cmd in &wd.commands {
            cursor.write_field(cmd.inst.bits(), 8);
            cursor.write_field(cmd.arg, 8);
        }
    }

    debug_assert!(cursor.is_exhausted());
    debug!(
        when_dos = entries.len(),
        dropped = rule.when_dos.len() - entries.len(),
        bytes = size,
        "packed rule"
    );
    cursor.into_inner()
}

fn invalid(field: &'static str, value: u8) -> FormatError {
    FormatError::InvalidField { field, value }
}

/// Decode a record produced by `pack` with the same kind counts.
///
/// The record must be consumed exactly; any truncation, trailing byte or
/// out-of-range value fails the whole decode.
pub fn unpack(bytes: &[u8], kinds: KindCounts) -> FormatResult<Rule> {
    let mut cursor = BitCursor::new(bytes);

    let type_bits = cursor.read_field(4)?;
    let rule_type = RuleType::from_bits(type_bits).ok_or(invalid("rule type", type_bits))?;
    let rule_arg = cursor.read_field(4)?;
    let sym_bits = cursor.read_field(4)?;
    let symmetry = Symmetry::from_bits(sym_bits).ok_or(invalid("symmetry", sym_bits))?;
    let count = cursor.read_field(4)? as usize;

    let mut rule = Rule::new(rule_type, rule_arg).with_symmetry(symmetry);
    let mut command_counts: SmallVec<[usize; MAX_WHEN_DOS]> = SmallVec::new();

    for _ in 0..count {
        let col = cursor.read_field(4)?;
        let row = cursor.read_field(4)?;
        let coord = Coord::new(col, row);
        if !coord.in_window() {
            return Err(FormatError::CoordOutOfWindow { col, row });
        }
        if rule.find(coord).is_some() {
            return Err(FormatError::DuplicateWhenDo { col, row });
        }

        let background = Predicate::from_bytes(
            cursor.read_raw(packed_len(kinds.backgrounds))?,
            kinds.backgrounds,
        );
        let sprites = Predicate::from_bytes(cursor.read_raw(packed_len(kinds.sprites))?, kinds.sprites);

        let dir_bits = cursor.read_field(4)?;
        let direction = Direction::from_bits(dir_bits).ok_or(invalid("direction", dir_bits))?;
        let commands = cursor.read_field(4)?;
        if commands as usize > MAX_COMMANDS {
            return Err(invalid("command count", commands));
        }
        command_counts.push(commands as usize);

        rule.when_dos.push(WhenDo {
            coord,
            background,
            sprites,
            direction,
            commands: SmallVec::new(),
        });
    }

    for (wd, &n) in rule.when_dos.iter_mut().zip(&command_counts) {
        for _ in 0..n {
            let inst_bits = cursor.read_field(8)?;
            let inst = CommandType::from_bits(inst_bits).ok_or(invalid("instruction", inst_bits))?;
            let arg = cursor.read_field(8)?;
            wd.commands.push(Command::new(inst, arg));
        }
    }

    if !cursor.is_exhausted() {
        return Err(FormatError::TrailingBytes {
            extra: cursor.remaining_bytes(),
        });
    }

    trace!(when_dos = count, bytes = bytes.len(), "unpacked rule");
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Attribute, ButtonArg, MoveArg};

    const KINDS: KindCounts = KindCounts::new(5, 3);

    fn sample() -> Rule {
        let mut rule = Rule::new(RuleType::ButtonPress, ButtonArg::Down.bits())
            .with_symmetry(Symmetry::Rotate3Way);
        let mut center = WhenDo::new(Coord::CENTER, KINDS);
        center.sprites.set(2, Attribute::Include);
        center.direction = Direction::Resting;
        center.commands.push(Command::movement(MoveArg::Down));
        rule.when_dos.push(center);

        let mut below = WhenDo::new(Coord::new(2, 3), KINDS);
        below.background.set(4, Attribute::Exclude);
        rule.when_dos.push(below);
        rule
    }

    #[test]
    fn test_header_and_record_bytes() {
        let bytes = pack(&sample(), KINDS);
        // 2 header + 2 * (2 + 2 + 1) + 1 command * 2
        assert_eq!(bytes.len(), 14);
        assert_eq!(bytes.len(), packed_size(&sample(), KINDS));
        assert_eq!(bytes[0], 0x03);
        assert_eq!(bytes[1], 0x62);
        assert_eq!(bytes[2], 0x22);
        // Centre: background all clear, sprite kind 2 Include at bits 4..6.
        assert_eq!(&bytes[3..6], &[0x00, 0x00, 0b0001_0000]);
        assert_eq!(bytes[6], 0x41);
        assert_eq!(bytes[7], 0x23);
        // Background kind 4 Exclude sits in the second byte, lowest bits.
        assert_eq!(&bytes[8..11], &[0x00, 0x03, 0x00]);
        assert_eq!(bytes[11], 0x60);
        assert_eq!(&bytes[12..], &[CommandType::Move.bits(), MoveArg::Down.bits()]);
    }

    #[test]
    fn test_round_trip() {
        let rule = sample();
        let bytes = pack(&rule, KINDS);
        assert_eq!(unpack(&bytes, KINDS).unwrap(), rule);
    }

    #[test]
    fn test_no_op_entries_dropped() {
        let mut rule = sample();
        rule.when_dos.push(WhenDo::new(Coord::new(0, 2), KINDS));
        let mut carrier = WhenDo::new(Coord::new(4, 2), KINDS);
        carrier.commands.push(Command::movement(MoveArg::Stop));
        rule.when_dos.push(carrier.clone());

        let decoded = unpack(&pack(&rule, KINDS), KINDS).unwrap();
        assert_eq!(decoded.when_dos.len(), 3);
        assert_eq!(decoded.when_dos[2], carrier);
        assert_eq!(decoded.find(Coord::new(0, 2)), None);
    }

    #[test]
    fn test_empty_rule() {
        let rule = Rule::new(RuleType::NegationCheck, 0);
        let bytes = pack(&rule, KINDS);
        assert_eq!(bytes, vec![0x30, 0x00]);
        assert_eq!(unpack(&bytes, KINDS).unwrap(), rule);
    }

    #[test]
    fn test_truncated_record() {
        let bytes = pack(&sample(), KINDS);
        for len in 0..bytes.len() {
            assert!(
                matches!(unpack(&bytes[..len], KINDS), Err(FormatError::UnexpectedEnd { .. })),
                "prefix of {len} bytes decoded"
            );
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = pack(&sample(), KINDS);
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(unpack(&bytes, KINDS), Err(FormatError::TrailingBytes { extra: 2 }));
    }

    #[test]
    fn test_invalid_values() {
        let bytes = pack(&sample(), KINDS);

        let mut bad = bytes.clone();
        bad[0] = 0x93;
        assert_eq!(unpack(&bad, KINDS), Err(invalid("rule type", 9)));

        let mut bad = bytes.clone();
        bad[1] = 0x72;
        assert_eq!(unpack(&bad, KINDS), Err(invalid("symmetry", 7)));

        let mut bad = bytes.clone();
        bad[2] = 0x52;
        assert_eq!(unpack(&bad, KINDS), Err(FormatError::CoordOutOfWindow { col: 5, row: 2 }));

        let mut bad = bytes.clone();
        bad[7] = 0x22;
        assert_eq!(unpack(&bad, KINDS), Err(FormatError::DuplicateWhenDo { col: 2, row: 2 }));

        let mut bad = bytes.clone();
        bad[6] = 0x81;
        assert_eq!(unpack(&bad, KINDS), Err(invalid("direction", 8)));

        let mut bad = bytes.clone();
        bad[12] = 0x07;
        assert_eq!(unpack(&bad, KINDS), Err(invalid("instruction", 7)));
    }

    #[test]
    #[should_panic(expected = "sized for")]
    fn test_mismatched_kinds_panics() {
        let _ = pack(&sample(), KindCounts::new(4, 3));
    }
}
