use moss_parser::{
    extract, Arguments, Document, ExtractError, Field, Range, Result, Rule, Spec, Target, Value,
};
use serde_json::json;

const HTML: &str = r#"
<html>
<head><title>Links</title></head>
<body>
    <a href="https://www.example.com/page1/link1?p=1&amp;q=1">link1</a>
    <div class="box">
        Ipsum 2
        <p>Lorem 2</p>
        <a href="https://www.example.com/page2/link2?p=2&amp;q=2">link2</a>
    </div>
    <a href="https://www.example.com/page3/link3?p=3&amp;q=3" rel="nofollow">link3</a>
    <a href="https://chat.openai.com/page4/link4?p=4&amp;q=4&amp;p=5">link4</a>
</body>
</html>
"#;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
struct Link {
    text: String,
    href: Option<String>,
    rel: String,
}

impl Target for Link {
    const FIELDS: &'static [Field] = &[
        Field::required("text"),
        Field::required("href"),
        Field::optional("rel"),
    ];

    fn build(mut args: Arguments) -> Result<Self> {
        Ok(Self {
            text: args.required("text")?,
            href: args.required("href")?,
            rel: args.optional("rel")?.unwrap_or_else(|| "follow".to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
struct Anchor {
    text: String,
    element: String,
    domain: Option<String>,
}

impl Target for Anchor {
    const FIELDS: &'static [Field] = &[Field::required("text")];
    const TAG_AWARE: bool = true;

    fn build(mut args: Arguments) -> Result<Self> {
        let text = args.required("text")?;
        let tag = args.tag();
        let domain = match &tag {
            Some(tag) => tag
                .extract(&Spec::new(".").nth(0).extract(Rule::HrefDomain).build()?)?
                .as_str()
                .map(str::to_string),
            None => None,
        };
        Ok(Self {
            text,
            element: tag.map(|t| t.name().to_string()).unwrap_or_default(),
            domain,
        })
    }
}

fn link_spec() -> Spec {
    Spec::new("a")
        .into_object::<Link>()
        .child(Spec::new(".").nth(0).key("text").build().unwrap())
        .child(Spec::new(".").nth(0).key("href").extract(Rule::Href).build().unwrap())
        .child(Spec::new(".").nth(0).key("rel").extract("rel").build().unwrap())
        .build()
        .unwrap()
}

#[test]
fn test_third_link_href() {
    let spec = Spec::new("a")
        .range(Range::slice(2, None).single())
        .extract(Rule::Href)
        .build()
        .unwrap();

    assert_eq!(
        extract(&spec, HTML).unwrap(),
        Value::from("https://www.example.com/page3/link3?p=3&q=3")
    );
}

#[test]
fn test_query_params_keep_repeated_values() {
    let spec = Spec::new("a")
        .nth(-1)
        .extract(Rule::HrefQueryParams)
        .build()
        .unwrap();

    let value = extract(&spec, HTML).unwrap();
    assert_eq!(value.to_json(), json!({"p": ["4", "5"], "q": ["4"]}));
    let keys: Vec<&String> = value.as_map().unwrap().keys().collect();
    assert_eq!(keys, vec!["p", "q"]);
}

#[test]
fn test_href_components() {
    let component = |rule: Rule| {
        let spec = Spec::new("a").nth(3).extract(rule).build().unwrap();
        extract(&spec, HTML).unwrap()
    };

    assert_eq!(component(Rule::HrefDomain), Value::from("chat.openai.com"));
    assert_eq!(component(Rule::HrefBaseDomain), Value::from("openai.com"));
    assert_eq!(component(Rule::HrefEndpoint), Value::from("/page4/link4"));
    assert_eq!(
        component(Rule::HrefEndpointWithQuery),
        Value::from("/page4/link4?p=4&q=4&p=5")
    );
    assert_eq!(component(Rule::HrefQuery), Value::from("p=4&q=4&p=5"));
}

#[test]
fn test_range_selection() {
    let texts = |range: Range| {
        let spec = Spec::new("a").range(range).build().unwrap();
        extract(&spec, HTML).unwrap()
    };

    assert_eq!(texts(Range::slice(1, Some(3))), Value::from(vec!["link2", "link3"]));
    assert_eq!(
        texts(Range::slice(1, Some(3)).reversed()),
        Value::from(vec!["link3", "link2"])
    );
    assert_eq!(texts(Range::slice(-2, None)), Value::from(vec!["link3", "link4"]));
    assert_eq!(texts(Range::slice(1, Some(3)).single()), Value::from("link2"));
    assert_eq!(texts(Range::slice(10, None)), Value::Absent);
    assert_eq!(texts(Range::slice(10, None).single()), Value::Absent);
}

#[test]
fn test_fragment_string_round_trip() {
    let direct = Spec::new("div.box")
        .nth(0)
        .into_dict()
        .child(Spec::new(".").nth(0).key("intro").extract(Rule::Text).build().unwrap())
        .child(Spec::new("p").nth(0).key("body").build().unwrap())
        .child(Spec::new("a").nth(0).key("href").extract(Rule::Href).build().unwrap())
        .build()
        .unwrap();

    let rendered = Spec::new("div.box")
        .nth(0)
        .extract(Rule::FragmentString)
        .build()
        .unwrap();
    let rendered = extract(&rendered, HTML).unwrap();
    let rendered = rendered.as_str().unwrap();
    assert!(rendered.starts_with("<div class=\"box\">\n"));

    let original = extract(&direct, HTML).unwrap();
    let reparsed = extract(&direct, rendered).unwrap();
    assert_eq!(original, reparsed);
    assert_eq!(
        original.to_json(),
        json!({
            "intro": "Ipsum 2",
            "body": "Lorem 2",
            "href": "https://www.example.com/page2/link2?p=2&q=2"
        })
    );
}

#[test]
fn test_extraction_is_deterministic() {
    let spec = link_spec();
    let first = extract(&spec, HTML).unwrap();
    for _ in 0..5 {
        assert_eq!(extract(&spec, HTML).unwrap(), first);
    }
}

#[test]
fn test_absent_values_fall_back_to_defaults() {
    let links = extract(&link_spec(), HTML).unwrap();
    let links = links.as_list().unwrap();
    assert_eq!(links.len(), 4);

    let first = links[0].downcast_ref::<Link>().unwrap();
    assert_eq!(first.rel, "follow");
    assert_eq!(first.href.as_deref(), Some("https://www.example.com/page1/link1?p=1&q=1"));

    let third = links[2].downcast_ref::<Link>().unwrap();
    assert_eq!(third.rel, "nofollow");
}

#[test]
fn test_required_parameter_must_be_bound() {
    // "href" is required but has no child spec
    let spec = Spec::new("a")
        .into_object::<Link>()
        .child(Spec::new(".").nth(0).key("text").build().unwrap())
        .build()
        .unwrap();

    let err = extract(&spec, HTML).unwrap_err();
    assert!(matches!(err, ExtractError::MissingParameter { ref param, .. } if param == "href"));
}

#[test]
fn test_tag_aware_targets_see_their_element() {
    let spec = Spec::new("div.box a")
        .nth(0)
        .into_object::<Anchor>()
        .child(Spec::new(".").nth(0).key("text").build().unwrap())
        .build()
        .unwrap();

    let value = extract(&spec, HTML).unwrap();
    assert_eq!(
        value.downcast_ref::<Anchor>(),
        Some(&Anchor {
            text: "link2".to_string(),
            element: "a".to_string(),
            domain: Some("www.example.com".to_string()),
        })
    );
}

#[test]
fn test_missing_nodes_are_soft_failures() {
    let spec = Spec::new("table td").build().unwrap();
    assert_eq!(extract(&spec, HTML).unwrap(), Value::Absent);

    let spec = Spec::new("table").extract(Rule::Found).build().unwrap();
    assert_eq!(extract(&spec, HTML).unwrap(), Value::Bool(false));

    let spec = Spec::new("div.box").nth(0).extract(Rule::Found).build().unwrap();
    assert_eq!(extract(&spec, HTML).unwrap(), Value::Bool(true));
}

#[test]
fn test_leaf_without_rule_is_an_error() {
    let spec = Spec::new("a").no_extract().build().unwrap();
    assert!(matches!(
        extract(&spec, HTML),
        Err(ExtractError::UnsupportedRule { .. })
    ));
}

#[test]
fn test_accessor_results_bypass_rules() {
    let spec = Spec::new("a::attr(href)")
        .nth(0)
        .extract(Rule::HrefDomain)
        .build()
        .unwrap();
    assert_eq!(
        extract(&spec, HTML).unwrap(),
        Value::from("https://www.example.com/page1/link1?p=1&q=1")
    );

    // raw text nodes, whitespace included
    let spec = Spec::new("div.box::text").build().unwrap();
    let texts = extract(&spec, HTML).unwrap();
    let texts = texts.as_list().unwrap();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].as_str().map(str::trim), Some("Ipsum 2"));
}

#[test]
fn test_raw_elements_borrow_the_document() {
    let doc = Document::parse(HTML);
    let spec = Spec::new("a").nth(1).extract(Rule::Raw).build().unwrap();

    let value = doc.extract(&spec).unwrap();
    let element = value.as_element().unwrap();
    assert_eq!(element.value().attr("href"), Some("https://www.example.com/page2/link2?p=2&q=2"));

    let owned = value.into_owned();
    assert!(owned.as_fragment().is_some());
}
