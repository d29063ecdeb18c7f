use std::collections::HashMap;

/// A keyword table: byte-string spelling to keyword id. Supplied to the
/// lexer at configure time.
pub type KeywordMap = HashMap<&'static str, u32>;

fn table(words: &[&'static str]) -> KeywordMap {
    words.iter().enumerate().map(|(i, w)| (*w, i as u32)).collect()
}

/// The target description language's keyword table.
pub fn tdl_keywords() -> KeywordMap {
    table(&[
        "target",
        "endian",
        "little",
        "big",
        "regclass",
        "register",
        "data",
        "bit",
        "extension",
        "instr",
        "imm",
        "str",
        "result",
        "clobber",
        "format",
        "width",
        "class",
        "parent",
        "init",
        "name",
        "__cpp_inc__",
    ])
}

/// IR keyword table: function-header keywords, type keywords, and one
/// mnemonic per supported instruction kind.
pub fn ir_keywords() -> KeywordMap {
    table(&[
        "func", "end", "local", "align", "int", "float", "double", "void",
        "alloc", "add", "sub", "mul", "div", "mov", "load", "store", "ret",
        "triple",
    ])
}

/// Look up the keyword string a keyword id was produced from. Used to
/// check that every keyword round-trips back to the string it came from.
pub fn keyword_name(map: &KeywordMap, id: u32) -> Option<&'static str> {
    map.iter().find(|(_, v)| **v == id).map(|(k, _)| *k)
}
