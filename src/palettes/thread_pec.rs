//! Brother PEC thread color palette
//!
//! The 64 colors addressable by PEC color-index bytes. PEC and PES files
//! without an embedded chart resolve thread indices against this table.

use crate::core::thread::EmbThread;
use lazy_static::lazy_static;

#[rustfmt::skip]
const PEC_COLORS: [(u32, &str, &str); 64] = [
    (0x1a0a94, "Prussian Blue", "01"),
    (0x0f75ff, "Blue", "02"),
    (0x00934c, "Teal Green", "03"),
    (0xbabdfe, "Corn Flower Blue", "04"),
    (0xec0000, "Red", "05"),
    (0xe4995a, "Reddish Brown", "06"),
    (0xcc48ab, "Magenta", "07"),
    (0xfdc4fa, "Light Lilac", "08"),
    (0xdd84cd, "Lilac", "09"),
    (0x6bd38a, "Mint Green", "10"),
    (0xe4a945, "Deep Gold", "11"),
    (0xffbd42, "Orange", "12"),
    (0xffe600, "Yellow", "13"),
    (0x6cd900, "Lime Green", "14"),
    (0xc1a941, "Brass", "15"),
    (0xb5ad97, "Silver", "16"),
    (0xba9c5f, "Russet Brown", "17"),
    (0xfaf59e, "Cream Brown", "18"),
    (0x808080, "Pewter", "19"),
    (0x000000, "Black", "20"),
    (0x001cdf, "Ultramarine", "21"),
    (0xdf00b8, "Royal Purple", "22"),
    (0x626262, "Dark Gray", "23"),
    (0x69260d, "Dark Brown", "24"),
    (0xff0060, "Deep Rose", "25"),
    (0xbf8200, "Light Brown", "26"),
    (0xf39178, "Salmon Pink", "27"),
    (0xff6805, "Vermilion", "28"),
    (0xf0f0f0, "White", "29"),
    (0xc832cd, "Violet", "30"),
    (0xb0bf9b, "Seacrest", "31"),
    (0x65bfeb, "Sky Blue", "32"),
    (0xffba04, "Yellow Ocher", "33"),
    (0xffb45f, "Pumpkin", "34"),
    (0xffe36e, "Cream Yellow", "35"),
    (0xf2ddb8, "Khaki", "36"),
    (0xe3ae78, "Clay Brown", "37"),
    (0x99cc00, "Leaf Green", "38"),
    (0x0c4d8c, "Peacock Blue", "39"),
    (0x8c8c8c, "Gray", "40"),
    (0xababab, "Warm Gray", "41"),
    (0x5c7534, "Dark Olive", "42"),
    (0xffd9cc, "Flesh Pink", "43"),
    (0xff9fd0, "Pink", "44"),
    (0x007436, "Deep Green", "45"),
    (0xb3b7f0, "Lavender", "46"),
    (0x7a68cc, "Wisteria Violet", "47"),
    (0xf5e3c0, "Beige", "48"),
    (0xbf0042, "Carmine", "49"),
    (0xd65c5c, "Amber Red", "50"),
    (0x5b724c, "Olive Green", "51"),
    (0xba0072, "Dark Fuchsia", "52"),
    (0xffc885, "Tangerine", "53"),
    (0x9fe7ff, "Light Blue", "54"),
    (0x00b35c, "Emerald Green", "55"),
    (0x8437b2, "Purple", "56"),
    (0x94b347, "Moss Green", "57"),
    (0xffe1d4, "Flesh Tone", "58"),
    (0xffc000, "Harvest Gold", "59"),
    (0x0077c2, "Electric Blue", "60"),
    (0xf0ff78, "Lemon Yellow", "61"),
    (0xc2e094, "Fresh Green", "62"),
    (0xffd9dd, "Applique Material", "63"),
    (0xfff0e6, "Applique Position", "64"),
];

lazy_static! {
    /// The PEC palette as thread records
    pub static ref PEC_THREADS: Vec<EmbThread> = PEC_COLORS
        .iter()
        .map(|&(color, description, catalog)| {
            EmbThread::new(color)
                .with_description(description)
                .with_catalog_number(catalog)
                .with_brand("Brother")
        })
        .collect();
}
