use core_selection::{
    EngineError, ModeKind, Movement, Resolution, ResolveContext, Selection, SelectionMode, resolve,
};
use core_syntax::{SyntaxProvider, TreeSitterSyntax};
use core_text::{Buffer, Version};
use pretty_assertions::assert_eq;

const SRC: &str = "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n\nfn main() {}\n";

struct Fixture {
    buffer: Buffer,
    tree: TreeSitterSyntax,
}

impl Fixture {
    fn new() -> Self {
        let buffer = Buffer::from_str("lib.rs", SRC).unwrap();
        let tree = TreeSitterSyntax::rust(buffer.version(), SRC).unwrap();
        Self { buffer, tree }
    }

    fn step(&self, mode: &SelectionMode, sel: &Selection, movement: Movement) -> Resolution {
        let ctx = ResolveContext::new(&self.buffer).with_syntax(Some(&self.tree));
        resolve(mode, &ctx, sel, movement).unwrap()
    }

    fn text(&self, res: &Resolution) -> &'static str {
        match res {
            Resolution::Found(sel) => &SRC[sel.range()],
            other => panic!("expected node, got {other:?}"),
        }
    }
}

fn nodes() -> SelectionMode {
    SelectionMode::new(ModeKind::SyntaxNode { kinds: vec![] })
}

#[test]
fn siblings_parent_and_child() {
    let f = Fixture::new();
    let mode = nodes();
    let name = f.step(&mode, &Selection::point(3), Movement::Current);
    assert_eq!(f.text(&name), "add");
    let params = f.step(&mode, &name.clone().found().unwrap(), Movement::Next);
    assert_eq!(f.text(&params), "(a: i32, b: i32)");
    let back = f.step(&mode, &params.clone().found().unwrap(), Movement::Previous);
    assert_eq!(back, name);
    let first_param = f.step(&mode, &params.clone().found().unwrap(), Movement::Down);
    assert_eq!(f.text(&first_param), "a: i32");
    let item = f.step(&mode, &params.found().unwrap(), Movement::Up);
    assert!(f.text(&item).starts_with("fn add"));
    let next_item = f.step(&mode, &item.found().unwrap(), Movement::Next);
    assert_eq!(f.text(&next_item), "fn main() {}");
}

#[test]
fn up_from_top_level_item_stops() {
    let f = Fixture::new();
    let mode = nodes();
    let main_item = Selection::new(SRC.find("fn main").unwrap()..SRC.len() - 1);
    assert_eq!(f.step(&mode, &main_item, Movement::Up), Resolution::NoMatch);
    assert_eq!(f.step(&mode, &main_item, Movement::Next), Resolution::NoMatch);
}

#[test]
fn kind_filter_climbs_to_matching_ancestor() {
    let f = Fixture::new();
    let mode = SelectionMode::new(ModeKind::SyntaxNode {
        kinds: vec!["function_item".into()],
    });
    let inside = Selection::point(SRC.find("a + b").unwrap());
    let item = f.step(&mode, &inside, Movement::Current);
    assert!(f.text(&item).starts_with("fn add"));
    assert!(f.text(&item).ends_with('}'));
}

#[test]
fn token_mode_uses_tree_leaves() {
    let f = Fixture::new();
    let mode = SelectionMode::new(ModeKind::Token);
    let arrow = f.step(&mode, &Selection::point(SRC.find("->").unwrap()), Movement::Current);
    assert_eq!(f.text(&arrow), "->");
    let ret = f.step(&mode, &arrow.found().unwrap(), Movement::Next);
    assert_eq!(f.text(&ret), "i32");
}

#[test]
fn stale_tree_is_a_contract_violation() {
    let f = Fixture::new();
    let mut tree = TreeSitterSyntax::rust(Version(0), SRC).unwrap();
    tree.reparse(Version(5), SRC).unwrap();
    assert_eq!(tree.version(), Version(5));
    let ctx = ResolveContext::new(&f.buffer).with_syntax(Some(&tree));
    let err = resolve(&nodes(), &ctx, &Selection::point(0), Movement::Next).unwrap_err();
    assert!(matches!(err, EngineError::ContractViolation(_)));
}
