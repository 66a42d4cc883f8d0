//! Precomputed attack tables.
//!
//! Leaper attacks (knight, king, pawn) are plain 64-entry tables. Sliding
//! attacks use magic bitboards: the relevant blocker squares are masked out
//! of the occupancy, multiplied by a per-square magic constant and shifted
//! down to index a dense table of attack sets. The magic constants are
//! well-known published values; the tables themselves are built from them
//! deterministically the first time they are touched.

use once_cell::sync::Lazy;

use super::bitboard::Bitboard;
use super::types::{Color, Square};

/// Knight attack set for each origin square.
static KNIGHT_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut attacks = [Bitboard::EMPTY; 64];
    let deltas = [
        (2, 1),
        (1, 2),
        (-1, 2),
        (-2, 1),
        (-2, -1),
        (-1, -2),
        (1, -2),
        (2, -1),
    ];
    for (idx, entry) in attacks.iter_mut().enumerate() {
        let sq = Square::from_index(idx);
        for (df, dr) in deltas {
            if let Some(target) = sq.offset(df, dr) {
                *entry |= Bitboard::from_square(target);
            }
        }
    }
    attacks
});

/// King attack set for each origin square.
static KING_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut attacks = [Bitboard::EMPTY; 64];
    for (idx, entry) in attacks.iter_mut().enumerate() {
        let bb = Bitboard(1u64 << idx);
        *entry = bb.north()
            | bb.south()
            | bb.east()
            | bb.west()
            | bb.north_east()
            | bb.north_west()
            | bb.south_east()
            | bb.south_west();
    }
    attacks
});

/// Squares a pawn of the given color attacks from each origin square.
static PAWN_ATTACKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut attacks = [[Bitboard::EMPTY; 64]; 2];
    for idx in 0..64 {
        let bb = Bitboard(1u64 << idx);
        attacks[Color::White.index()][idx] = bb.north_east() | bb.north_west();
        attacks[Color::Black.index()][idx] = bb.south_east() | bb.south_west();
    }
    attacks
});

#[inline]
#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.index()]
}

#[inline]
#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.index()]
}

#[inline]
#[must_use]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    PAWN_ATTACKS[color.index()][sq.index()]
}

/// Rook attacks from `sq` treating `occupancy` as blockers. Blocker
/// squares themselves are included in the result.
#[inline]
#[must_use]
pub fn rook_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    SLIDING.rook_attacks(sq, occupancy)
}

/// Bishop attacks from `sq` treating `occupancy` as blockers.
#[inline]
#[must_use]
pub fn bishop_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    SLIDING.bishop_attacks(sq, occupancy)
}

/// Queen attacks: the union of rook and bishop attacks from `sq`.
#[inline]
#[must_use]
pub fn queen_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    SLIDING.rook_attacks(sq, occupancy) | SLIDING.bishop_attacks(sq, occupancy)
}

// ============================================================================
// Magic tables
// ============================================================================

/// Published rook magics (Chess Programming Wiki lineage; the rank-7/8
/// entries below the natural bit count are by Osborne, Annuss, Fiekas and
/// Österlund).
#[rustfmt::skip]
const ROOK_MAGICS: [u64; 64] = [
    0x4080_0020_4000_1480, 0x0040_0010_0140_2000, 0x0300_2000_1810_4100, 0x2100_0409_0110_0120,
    0x8a00_0600_0408_2070, 0x0080_0144_0002_0080, 0x1100_2500_208a_0004, 0x0900_0042_2201_8100,
    0x0208_8002_28c0_0081, 0x2280_4010_0340_2000, 0x0008_8010_0020_0184, 0x0001_0020_1000_0900,
    0x0182_0006_0010_6008, 0x2058_8004_0080_0200, 0x0004_8002_0080_0900, 0x052d_0012_0040_a100,
    0x0540_0880_0080_24c1, 0x2000_8480_4002_2000, 0x0400_4100_1100_6000, 0x0040_a100_3001_0108,
    0x1204_8080_0800_0402, 0x0802_8080_0400_2201, 0x1002_8080_5200_0500, 0x0004_0a00_2112_4184,
    0x0640_0128_8008_8040, 0x8410_4000_8020_008a, 0x0400_2008_8010_0080, 0x2001_0121_0009_1004,
    0x1200_0d01_0008_0010, 0x6004_0004_0120_1008, 0x7500_aa04_0008_4110, 0x0100_0052_0004_0981,
    0x0040_8040_0280_0020, 0x0470_0020_0640_0240, 0x0001_2000_8080_1000, 0x0000_0812_0200_2040,
    0x00c0_8044_0080_0800, 0x9000_800a_0080_0400, 0x0001_0004_0100_0600, 0x0042_1088_ca00_2401,
    0x0000_c000_228d_8000, 0x6410_0420_1440_4001, 0x1002_0040_8226_0014, 0x206a_0088_11c2_0021,
    0x0002_0018_1022_0024, 0x2001_0200_0400_8080, 0x1000_0801_100c_001a, 0x0048_0082_5402_0011,
    0x48ff_fe99_fecf_aa00, 0x48ff_fe99_fecf_aa00, 0x497f_ffad_ff9c_2e00, 0x613f_ffdd_ffce_9200,
    0xffff_ffe9_ffe7_ce00, 0xffff_fff5_fff3_e600, 0x0003_ff95_e5e6_a4c0, 0x510f_fff5_f63c_96a0,
    0xebff_ffb9_ff9f_c526, 0x61ff_fedd_feed_aeae, 0x53bf_ffed_ffde_b1a2, 0x127f_ffb9_ffdf_b5f6,
    0x411f_ffdd_ffdb_f4d6, 0x0822_0024_0810_4502, 0x0003_ffef_27ee_be74, 0x7645_fffe_cbfe_a79e,
];

/// Index bits per square for the rook tables.
#[rustfmt::skip]
const ROOK_BITS: [u8; 64] = [
    12, 11, 11, 11, 11, 11, 11, 12,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    10,  9,  9,  9,  9,  9,  9, 10,
    11, 10, 10, 10, 10, 11, 10, 11,
];

/// Published bishop magics, same lineage as the rook set.
#[rustfmt::skip]
const BISHOP_MAGICS: [u64; 64] = [
    0xffed_f9fd_7cfc_ffff, 0xfc09_6285_4a77_f576, 0x0012_2808_c102_a004, 0x2851_2400_8240_0440,
    0x0011_1040_1100_0202, 0x0008_2208_2000_0010, 0xfc0a_66c6_4a7e_f576, 0x7ffd_fdfc_bd79_ffff,
    0xfc08_46a6_4a34_fff6, 0xfc08_7a87_4a3c_f7f6, 0x0009_8802_0420_a000, 0x8000_4404_0080_8200,
    0x208c_8450_c001_3407, 0x1980_1105_2010_8030, 0xfc08_64ae_59b4_ff76, 0x3c08_60af_4b35_ff76,
    0x73c0_1af5_6cf4_cffb, 0x41a0_1cfa_d64a_affc, 0x0604_0002_04a2_0202, 0x0002_8208_0602_4000,
    0x008a_0024_2201_0201, 0x2082_0040_8801_0802, 0x7c0c_028f_5b34_ff76, 0xfc0a_028e_5ab4_df76,
    0x0810_0420_d104_1080, 0x0904_5100_0210_0100, 0x0202_2808_0406_4403, 0x004c_0040_0c03_0082,
    0x0602_0010_0200_5011, 0x7209_0200_c108_9000, 0x4211_4104_2400_8805, 0x0002_8484_2126_0804,
    0xc001_0412_1121_2004, 0x0208_0188_0004_4800, 0x0080_2064_1058_0800, 0x0000_2011_0008_0084,
    0x0208_0034_0009_4100, 0x2190_4102_0000_4058, 0x0188_8214_0180_8080, 0x2006_0a02_0000_c4c0,
    0xdcef_d9b5_4bfc_c09f, 0xf95f_fa76_5afd_602b, 0x200a_1041_1000_2040, 0x0800_000c_0831_0c00,
    0x0218_0401_0a01_0400, 0x1092_2004_0022_4100, 0x43ff_9a5c_f4ca_0c01, 0x4bff_cd8e_7c58_7601,
    0xfc0f_f286_5334_f576, 0xfc0b_f6ce_5924_f576, 0x8052_2060_8c30_0001, 0x2084_1050_4202_0400,
    0xe018_8010_2206_0220, 0x0001_1220_4901_0200, 0xc3ff_b7dc_36ca_8c89, 0xc3ff_8a54_f4ca_2c89,
    0xffff_fcfc_fd79_edff, 0xfc08_63fc_cb14_7576, 0x40a0_0400_6213_3000, 0x0142_0280_0084_0400,
    0x0009_0900_1006_1200, 0x0800_8445_2810_0308, 0xfc08_7e8e_4bb2_f736, 0x43ff_9e4e_f4ca_2c89,
];

/// Index bits per square for the bishop tables.
#[rustfmt::skip]
const BISHOP_BITS: [u8; 64] = [
    5, 4, 5, 5, 5, 5, 4, 5,
    4, 4, 5, 5, 5, 5, 4, 4,
    4, 4, 7, 7, 7, 7, 4, 4,
    5, 5, 7, 9, 9, 7, 5, 5,
    5, 5, 7, 9, 9, 7, 5, 5,
    4, 4, 7, 7, 7, 7, 4, 4,
    4, 4, 5, 5, 5, 5, 4, 4,
    5, 4, 5, 5, 5, 5, 4, 5,
];

const ROOK_DELTAS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const BISHOP_DELTAS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Per-square magic lookup data.
#[derive(Clone, Copy)]
struct MagicEntry {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl MagicEntry {
    #[inline]
    fn key(&self, occupancy: Bitboard) -> usize {
        self.offset + (((occupancy.0 & self.mask).wrapping_mul(self.magic)) >> self.shift) as usize
    }
}

/// All sliding-attack data, built once at startup.
struct SlidingTables {
    rook: [MagicEntry; 64],
    bishop: [MagicEntry; 64],
    rook_table: Vec<Bitboard>,
    bishop_table: Vec<Bitboard>,
}

static SLIDING: Lazy<SlidingTables> = Lazy::new(SlidingTables::build);

impl SlidingTables {
    #[inline]
    fn rook_attacks(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        self.rook_table[self.rook[sq.index()].key(occupancy)]
    }

    #[inline]
    fn bishop_attacks(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        self.bishop_table[self.bishop[sq.index()].key(occupancy)]
    }

    fn build() -> Self {
        let (rook, rook_table) = build_piece_tables(&ROOK_MAGICS, &ROOK_BITS, &ROOK_DELTAS);
        let (bishop, bishop_table) =
            build_piece_tables(&BISHOP_MAGICS, &BISHOP_BITS, &BISHOP_DELTAS);
        SlidingTables {
            rook,
            bishop,
            rook_table,
            bishop_table,
        }
    }
}

fn build_piece_tables(
    magics: &[u64; 64],
    bits: &[u8; 64],
    deltas: &[(i8, i8); 4],
) -> ([MagicEntry; 64], Vec<Bitboard>) {
    let total: usize = bits.iter().map(|&b| 1usize << b).sum();
    let mut table = vec![Bitboard::EMPTY; total];
    let mut entries = [MagicEntry {
        mask: 0,
        magic: 0,
        shift: 0,
        offset: 0,
    }; 64];

    let mut offset = 0;
    for idx in 0..64 {
        let sq = Square::from_index(idx);
        let mask = relevant_mask(sq, deltas);
        let entry = MagicEntry {
            mask: mask.0,
            magic: magics[idx],
            shift: 64 - u32::from(bits[idx]),
            offset,
        };
        entries[idx] = entry;

        // Carry-rippler enumeration of every blocker subset of the mask.
        let mut blockers = Bitboard::EMPTY;
        loop {
            let attack = ray_attacks(sq, blockers, deltas);
            let key = entry.key(blockers);
            debug_assert!(
                table[key].is_empty() || table[key] == attack,
                "magic collision maps to a different attack set"
            );
            table[key] = attack;
            blockers = Bitboard(blockers.0.wrapping_sub(mask.0) & mask.0);
            if blockers.is_empty() {
                break;
            }
        }

        offset += 1usize << bits[idx];
    }

    (entries, table)
}

/// Blocker squares that matter for sliding attacks from `sq`: the rays in
/// each direction with the final edge square trimmed off.
fn relevant_mask(sq: Square, deltas: &[(i8, i8); 4]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for &(df, dr) in deltas {
        let mut cur = sq;
        while let Some(next) = cur.offset(df, dr) {
            if next.offset(df, dr).is_none() {
                break; // edge square never affects the attack set
            }
            mask |= Bitboard::from_square(next);
            cur = next;
        }
    }
    mask
}

/// Slow ray-walk attack generation, used to seed the magic tables (and as
/// the oracle in tests).
pub(crate) fn ray_attacks(sq: Square, occupancy: Bitboard, deltas: &[(i8, i8); 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &(df, dr) in deltas {
        let mut cur = sq;
        while let Some(next) = cur.offset(df, dr) {
            attacks |= Bitboard::from_square(next);
            if occupancy.contains(next) {
                break;
            }
            cur = next;
        }
    }
    attacks
}
