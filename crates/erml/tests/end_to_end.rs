//! End-to-end scenarios: notation in, DOT out

use erml::render;

const HEADER: &str = "graph {\noverlap=false\nsplines=true\nnodesep=0.5\nK=0.2\n";

#[test]
fn test_single_entity_document() {
    let dot = render("Person: [id] name").unwrap();
    assert_eq!(
        dot,
        "graph {\n\
         overlap=false\n\
         splines=true\n\
         nodesep=0.5\n\
         K=0.2\n\
         subgraph cluster0 {\n\
         style=invis\n\
         K=0.05\n\
         \"Person\" [shape=box,label=\"Person\"]\n\
         \"Person.id\" [shape=ellipse,label=<<u>id</u>>]\n\
         \"Person\" -- \"Person.id\"\n\
         \"Person.name\" [shape=ellipse,label=\"name\"]\n\
         \"Person\" -- \"Person.name\"\n\
         }\n\
         }"
    );
}

#[test]
fn test_binary_relationship_document() {
    let dot = render("A: [id]\nB: x\n<R>: -1>A =N(b)>B since").unwrap();
    let expected = [
        "subgraph cluster0 {",
        "style=invis",
        "K=0.05",
        "\"A\" [shape=box,label=\"A\"]",
        "\"A.id\" [shape=ellipse,label=<<u>id</u>>]",
        "\"A\" -- \"A.id\"",
        "}",
        "subgraph cluster1 {",
        "style=invis",
        "K=0.05",
        "\"B\" [shape=box,label=\"B\"]",
        "\"B.x\" [shape=ellipse,label=\"x\"]",
        "\"B\" -- \"B.x\"",
        "}",
        "subgraph cluster2 {",
        "style=invis",
        "K=0.05",
        "\"R\" [shape=diamond,label=\"R\"]",
        "\"R.since\" [shape=ellipse,label=\"since\"]",
        "\"R\" -- \"R.since\"",
        "}",
        "\"R\" -- \"A\" [taillabel=\"1\"]",
        "\"R\":w -- \"B\" [taillabel=\"N\",color=\"black:black\",label=\"b\"]",
    ]
    .join("\n");
    assert_eq!(dot, format!("{}{}\n}}", HEADER, expected));
}

#[test]
fn test_implicit_direct_subclasses() {
    let dot = render("Vehicle: [vin]\n  Car: doors\n  Truck: payload\nGarage: name").unwrap();
    assert!(dot.contains("\"Vehicle\" -- \"Car\" [arrowtail=icurve, dir=back]"));
    assert!(dot.contains("\"Vehicle\" -- \"Truck\" [arrowtail=icurve, dir=back]"));
    assert!(!dot.contains("shape=circle"));
}

#[test]
fn test_optional_disjoint_group() {
    let dot = render("Account: [number]\n  Savings: rate\n  Checking: fee\n  Account^Savings^Checking")
        .unwrap();
    assert!(dot.contains("\".1\" [shape=circle,fixedsize=true,width=0.3,height=0.3,label=d]"));
    assert!(dot.contains("\".1\" -- \"Savings\" [arrowtail=icurve, dir=back]"));
    assert!(dot.contains("\".1\" -- \"Checking\" [arrowtail=icurve, dir=back]"));
    // Optional coverage uses a single line
    assert!(dot.contains("\n\"Account\" -- \".1\"\n"));
}

#[test]
fn test_subclass_reference_pulls_entity_into_block() {
    let dot = render("Intern: hours\nStaff: [id]\n  Manager: level\n  [Intern]\n  Manager|Intern")
        .unwrap();
    assert!(dot.contains("label=o]"));
    assert!(dot.contains("\"Staff\" -- \".2\" [color=\"black:black\"]"));
    assert!(dot.contains("\".2\" -- \"Intern\" [arrowtail=icurve, dir=back]"));
}

#[test]
fn test_nested_hierarchy() {
    let source = "\
Animal: [tag]
  Mammal: fur
    Dog: breed
    Cat: lives
  Bird: wingspan
";
    let dot = render(source).unwrap();
    assert!(dot.contains("\"Mammal\" -- \"Dog\" [arrowtail=icurve, dir=back]"));
    assert!(dot.contains("\"Mammal\" -- \"Cat\" [arrowtail=icurve, dir=back]"));
    assert!(dot.contains("\"Animal\" -- \"Mammal\" [arrowtail=icurve, dir=back]"));
    assert!(dot.contains("\"Animal\" -- \"Bird\" [arrowtail=icurve, dir=back]"));
    assert!(!dot.contains("\"Animal\" -- \"Dog\""));
}

#[test]
fn test_weak_entity_document() {
    let dot = render("Order: [id]\nLine: [pos] qty\n<Has>: =1>Order *N>Line").unwrap();
    assert!(dot.contains("\"Line\" [shape=box,label=\"Line\",peripheries=2]"));
    assert!(dot.contains("\"Line.pos\" [shape=ellipse,label=\"p\u{0331}o\u{0331}s\u{0331}\"]"));
    assert!(dot.contains("\"Has\" [shape=diamond,label=\"Has\",peripheries=2]"));
    assert!(dot.contains("\"Order.id\" [shape=ellipse,label=<<u>id</u>>]"));
}

#[test]
fn test_unary_relationship_uses_anchors() {
    let dot = render("Employee: [id]\n<Supervises>: -1(boss)>Employee").unwrap();
    assert!(dot.contains(
        "\"Supervises\":w -- \"Employee\" [taillabel=\"1\",label=\"boss\"]"
    ));
}

#[test]
fn test_continuation_lines_extend_declarations() {
    let source = "\
Person: [id]
+ name{first
+ last}
<Knows>: -N>Person
+ since
";
    let dot = render(source).unwrap();
    assert!(dot.contains("\"Person.name.first\" [shape=ellipse,label=\"first\"]"));
    assert!(dot.contains("\"Person.name.last\" [shape=ellipse,label=\"last\"]"));
    assert!(dot.contains("\"Knows.since\" [shape=ellipse,label=\"since\"]"));
}

#[test]
fn test_empty_and_blank_sources() {
    let empty = format!("{}}}", HEADER);
    assert_eq!(render("").unwrap(), empty);
    assert_eq!(render("\n   \n\t\n").unwrap(), empty);
}
