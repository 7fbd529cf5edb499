use std::sync::atomic::{AtomicUsize, Ordering};

use keyword_core::{
    ArgumentSpec, DynamicCore, Error, INIT, INTRO, KeywordError, KeywordLibrary, Library,
    LibraryType, Map, Namespace, Provider, keyword,
};
use serde_json::{Value, json};

mod elements {
    use keyword_core::keyword;
    use serde_json::{Map, Value, json};

    pub const MODULE: &str = module_path!();

    #[derive(Debug, thiserror::Error)]
    #[error("element `{0}` not found")]
    pub struct ElementNotFound(pub String);

    #[keyword("Click Element", tags = ["interaction"])]
    /// Clicks the element identified by `locator`.
    pub fn click_element(locator: String) -> String {
        format!("clicked {locator}")
    }

    #[keyword]
    /// Types text into an input.
    ///
    /// Clears the field first when `clear` is set.
    pub fn input_text(locator: String, text: String, #[arg(default = false)] clear: bool) -> String {
        if clear {
            format!("{locator} <- {text} (cleared)")
        } else {
            format!("{locator} <- {text}")
        }
    }

    #[keyword]
    pub fn log_many(#[arg(varargs)] messages: Vec<String>) -> usize {
        messages.len()
    }

    #[keyword]
    pub fn create_webdriver(
        driver: String,
        #[arg(default = "default".to_owned())] alias: String,
        #[arg(kwargs)] options: Map<String, Value>,
    ) -> Value {
        json!({ "driver": driver, "alias": alias, "options": options })
    }

    #[keyword]
    pub fn wait_until_visible(locator: String) -> Result<(), ElementNotFound> {
        Err(ElementNotFound(locator))
    }

    #[keyword]
    pub fn title() -> anyhow::Result<String> {
        Ok("Home".to_owned())
    }

    #[keyword]
    pub fn fail_hard() -> anyhow::Result<()> {
        anyhow::bail!("driver crashed")
    }

    #[keyword]
    #[doc = concat!("Reads the page ", "source.")]
    /// Returns raw HTML.
    pub fn page_source() -> String {
        "<html></html>".to_owned()
    }

    #[allow(dead_code)]
    pub fn not_a_keyword() {}
}

#[derive(Default)]
struct Browser {
    opened: AtomicUsize,
}

impl Browser {
    #[keyword("Open Browser", tags = ["browser", "setup"])]
    /// Opens a browser at `url`.
    fn open_browser(&self, url: String, #[arg(default = "chrome".to_owned())] browser: String) -> String {
        self.opened.fetch_add(1, Ordering::SeqCst);
        format!("{browser}: {url}")
    }

    #[keyword]
    fn opened_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    #[keyword("Click Element")]
    fn click(&self, locator: String) -> String {
        format!("browser clicked {locator}")
    }
}

impl Library for Browser {
    fn library_type() -> LibraryType<Self> {
        LibraryType::new()
            .with_doc("Browser keywords.")
            .with_init(
                ArgumentSpec::builder()
                    .arg_with_default("timeout", 5)
                    .build()
                    .unwrap(),
                "Creates the library.",
            )
            .method(Self::__keyword_open_browser())
            .method(Self::__keyword_opened_count())
            .method(Self::__keyword_click())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("keyword_registry=debug")
        .with_test_writer()
        .try_init();
}

fn core() -> DynamicCore<Browser> {
    init_tracing();
    DynamicCore::new(
        Browser::default(),
        [Provider::namespace(Namespace::from_module(elements::MODULE))],
    )
    .unwrap()
}

fn run(core: &DynamicCore<Browser>, name: &str, args: Vec<Value>) -> keyword_core::Result<Value> {
    core.run_keyword(name, args, Map::new())
}

#[test]
fn keyword_names_cover_functions_and_methods() {
    assert_eq!(
        core().keyword_names(),
        [
            "Click Element",
            "Open Browser",
            "create_webdriver",
            "fail_hard",
            "input_text",
            "log_many",
            "opened_count",
            "page_source",
            "title",
            "wait_until_visible",
        ]
    );
}

#[test]
fn owner_methods_override_provider_functions() {
    let core = core();
    assert_eq!(
        run(&core, "Click Element", vec![json!("#submit")]).unwrap(),
        json!("browser clicked #submit")
    );
    assert!(core.resolve("Click Element").unwrap().provider().ends_with("Browser"));
    assert!(core.resolve("click_element").is_none());
}

#[test]
fn methods_share_owner_state() {
    let core = core();
    run(&core, "Open Browser", vec![json!("https://example.com")]).unwrap();
    assert_eq!(
        run(&core, "Open Browser", vec![json!("https://example.com"), json!("firefox")]).unwrap(),
        json!("firefox: https://example.com")
    );
    assert_eq!(run(&core, "opened_count", Vec::new()).unwrap(), json!(2));
    assert_eq!(core.owner().opened.load(Ordering::SeqCst), 2);
}

#[test]
fn argument_descriptors_follow_rust_signatures() {
    let core = core();
    assert_eq!(
        core.keyword_arguments("Open Browser").unwrap(),
        ["url", "browser=chrome"]
    );
    assert_eq!(
        core.keyword_arguments("input_text").unwrap(),
        ["locator", "text", "clear=false"]
    );
    assert_eq!(core.keyword_arguments("log_many").unwrap(), ["*messages"]);
    assert_eq!(
        core.keyword_arguments("create_webdriver").unwrap(),
        ["driver", "alias=default", "**options"]
    );
    assert!(core.keyword_arguments("title").unwrap().is_empty());
    assert_eq!(core.keyword_arguments(INIT).unwrap(), ["timeout=5"]);
}

#[test]
fn named_and_variadic_arguments_bind() {
    let core = core();
    assert_eq!(
        run(&core, "log_many", vec![json!("a"), json!("b"), json!("c")]).unwrap(),
        json!(3)
    );

    let mut kwargs = Map::new();
    kwargs.insert("alias".into(), json!("main"));
    kwargs.insert("headless".into(), json!(true));
    let created = core
        .run_keyword("create_webdriver", vec![json!("firefox")], kwargs)
        .unwrap();
    assert_eq!(
        created,
        json!({ "driver": "firefox", "alias": "main", "options": { "headless": true } })
    );

    let mut kwargs = Map::new();
    kwargs.insert("clear".into(), json!(true));
    assert_eq!(
        core.run_keyword("input_text", vec![json!("#q"), json!("rust")], kwargs)
            .unwrap(),
        json!("#q <- rust (cleared)")
    );
}

#[test]
fn binding_failures_are_reported_as_keyword_errors() {
    let core = core();

    let err = run(&core, "input_text", vec![json!("#q")]).unwrap_err();
    assert_eq!(err.to_string(), "input_text() missing required argument `text`");

    let err = run(&core, "title", vec![json!(1)]).unwrap_err();
    assert!(matches!(
        err,
        Error::Keyword(KeywordError::TooManyArguments { expected: 0, given: 1, .. })
    ));

    let err = run(&core, "input_text", vec![json!("#q"), json!("x"), json!("yes")]).unwrap_err();
    assert!(matches!(
        err,
        Error::Keyword(KeywordError::InvalidArgument { ref name, .. }) if name == "clear"
    ));

    let mut kwargs = Map::new();
    kwargs.insert("locator".into(), json!("#other"));
    let err = core
        .run_keyword("Open Browser", vec![json!("https://example.com")], kwargs)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Keyword(KeywordError::UnexpectedArgument { ref name, .. }) if name == "locator"
    ));
}

#[test]
fn fallible_keywords_surface_their_own_errors() {
    let core = core();
    assert_eq!(run(&core, "title", Vec::new()).unwrap(), json!("Home"));

    let err = run(&core, "wait_until_visible", vec![json!("#spinner")]).unwrap_err();
    let Error::Keyword(inner) = &err else {
        panic!("expected keyword failure, got {err:?}");
    };
    let cause = inner.downcast_ref::<elements::ElementNotFound>().unwrap();
    assert_eq!(cause.0, "#spinner");

    let err = run(&core, "fail_hard", Vec::new()).unwrap_err();
    assert_eq!(err.to_string(), "driver crashed");
}

#[test]
fn documentation_lists_tags_until_host_queries_them() {
    let core = core();
    assert_eq!(core.keyword_documentation(INTRO).unwrap(), "Browser keywords.");
    assert_eq!(core.keyword_documentation(INIT).unwrap(), "Creates the library.");
    assert_eq!(
        core.keyword_documentation("input_text").unwrap(),
        "Types text into an input.\n\nClears the field first when `clear` is set."
    );
    assert_eq!(
        core.keyword_documentation("Open Browser").unwrap(),
        "Opens a browser at `url`.\n\nTags: browser, setup"
    );
    assert_eq!(core.keyword_documentation("log_many").unwrap(), "");
    assert_eq!(
        core.keyword_documentation("page_source").unwrap(),
        "Reads the page source.\nReturns raw HTML."
    );

    assert_eq!(core.keyword_tags("Open Browser").unwrap(), ["browser", "setup"]);
    assert_eq!(
        core.keyword_documentation("Open Browser").unwrap(),
        "Opens a browser at `url`."
    );
}

#[test]
fn unknown_names_fail_like_missing_attributes() {
    let core = core();
    let err = run(&core, "Close Browser", Vec::new()).unwrap_err();
    assert!(err.to_string().ends_with("has no attribute `Close Browser`"));
    assert!(core.keyword_tags("Close Browser").is_err());
}

#[test]
fn hosts_drive_the_core_through_the_trait() {
    let host: Box<dyn KeywordLibrary> = Box::new(core());
    assert_eq!(host.keyword_names().len(), 10);
    assert_eq!(
        host.run_keyword("Open Browser", vec![json!("about:blank")], Map::new())
            .unwrap(),
        json!("chrome: about:blank")
    );
    assert_eq!(host.keyword_tags("Click Element").unwrap(), Vec::<String>::new());
}

#[test]
fn describe_serialises_every_keyword() {
    let info = core().describe();
    let open = info.iter().find(|k| k.name == "Open Browser").unwrap();
    assert_eq!(open.tags, ["browser", "setup"]);
    assert_eq!(open.arguments, ["url", "browser=chrome"]);

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 10);
    assert_eq!(json[0]["name"], "Click Element");
}
