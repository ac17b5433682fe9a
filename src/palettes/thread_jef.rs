//! Janome JEF thread color palette
//!
//! The 79-slot Janome table. Index 0 is a placeholder used by change-to-stop
//! encoding and carries no thread.

use crate::core::thread::EmbThread;
use lazy_static::lazy_static;

#[rustfmt::skip]
const JEF_COLORS: [(u32, &str, &str); 78] = [
    (0x000000, "Black", "002"),
    (0xffffff, "White", "001"),
    (0xffff17, "Yellow", "204"),
    (0xff9d00, "Orange", "203"),
    (0x5c9a1f, "Olive Green", "219"),
    (0x00a23f, "Green", "226"),
    (0x77c3dc, "Sky", "217"),
    (0x8356a6, "Purple", "208"),
    (0xfc82c3, "Pink", "201"),
    (0xff0000, "Red", "225"),
    (0xb8482b, "Brown", "257"),
    (0x0b2d90, "Blue", "211"),
    (0xe3c855, "Gold", "237"),
    (0x4f2017, "Dark Brown", "213"),
    (0xa99ccb, "Pale Violet", "215"),
    (0xfdf391, "Pale Yellow", "231"),
    (0xffd2dd, "Pale Pink", "200"),
    (0xffbe9f, "Peach", "251"),
    (0xd0a65f, "Beige", "212"),
    (0x7b1414, "Wine Red", "224"),
    (0xc4d9e7, "Pale Sky", "210"),
    (0x89d454, "Yellow Green", "227"),
    (0xb5b5b5, "Silver Gray", "220"),
    (0x737373, "Gray", "222"),
    (0x3e7f3a, "Grass Green", "269"),
    (0x192763, "Navy", "205"),
    (0xfbd4c3, "Cream Brown", "268"),
    (0x006a8b, "Deep Sky", "274"),
    (0xffb5b5, "Rose Pink", "280"),
    (0x793d00, "Coffee Brown", "243"),
    (0xa76a4e, "Caramel", "258"),
    (0xff5e32, "Carmine", "223"),
    (0x577f9d, "Steel Blue", "259"),
    (0x84b8ff, "Cornflower", "260"),
    (0x00cccc, "Turquoise", "261"),
    (0xcfff7d, "Lime", "262"),
    (0xffd800, "Sunflower", "263"),
    (0xdb83b4, "Orchid", "264"),
    (0x8f0040, "Maroon", "265"),
    (0x5500a0, "Royal Purple", "266"),
    (0x0000cc, "Royal Blue", "267"),
    (0x003c00, "Forest Green", "270"),
    (0x80ffcc, "Aqua Green", "271"),
    (0xd8c5a7, "Sand", "272"),
    (0x6b6b00, "Khaki", "273"),
    (0xff8c69, "Shrimp", "275"),
    (0xc0c0ff, "Ice Blue", "276"),
    (0x404040, "Charcoal", "277"),
    (0xcc8800, "Amber", "278"),
    (0xe8e8d0, "Eggshell", "279"),
    (0x990000, "Crimson", "281"),
    (0x006600, "Holly Green", "282"),
    (0x3399ff, "Azure", "283"),
    (0xffcc00, "Canary", "284"),
    (0xcc66cc, "Mauve", "285"),
    (0x663300, "Chestnut", "286"),
    (0x99ff99, "Mint", "287"),
    (0x333399, "Midnight", "288"),
    (0xff99cc, "Blush", "289"),
    (0x669966, "Sage", "290"),
    (0xffffcc, "Ivory", "291"),
    (0x009999, "Teal", "292"),
    (0xcc3300, "Rust", "293"),
    (0x9999ff, "Periwinkle", "294"),
    (0x806040, "Taupe", "295"),
    (0xff6600, "Tangerine", "296"),
    (0x004080, "Marine", "297"),
    (0xd4ff00, "Chartreuse", "298"),
    (0xb03060, "Berry", "299"),
    (0x708090, "Slate", "300"),
    (0xf8f8ff, "Snow", "301"),
    (0x8b4513, "Saddle", "302"),
    (0x20b2aa, "Lagoon", "303"),
    (0xdda0dd, "Plum", "304"),
    (0x556b2f, "Moss", "305"),
    (0xffa07a, "Salmon", "306"),
    (0x4682b4, "Harbor Blue", "307"),
    (0xd2b48c, "Camel", "308"),
];

lazy_static! {
    /// The JEF palette; index 0 is a placeholder entry
    pub static ref JEF_THREADS: Vec<Option<EmbThread>> = {
        let mut threads: Vec<Option<EmbThread>> = Vec::with_capacity(JEF_COLORS.len() + 1);
        threads.push(None);
        threads.extend(JEF_COLORS.iter().map(|&(color, description, catalog)| {
            Some(
                EmbThread::new(color)
                    .with_description(description)
                    .with_catalog_number(catalog)
                    .with_brand("Janome"),
            )
        }));
        threads
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_size() {
        assert_eq!(JEF_THREADS.len(), 79);
    }

    #[test]
    fn test_placeholder_slot() {
        assert!(JEF_THREADS[0].is_none());
        assert!(JEF_THREADS[1].is_some());
    }
}
