//! Page lifecycle example - building content before the body exists

use shim::{Document, Dom, Event};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // A document the parser has only just started on
    let dom = Dom::new(Document::loading("https://example.com/"));
    println!("Listener API: {}", dom.registrar_name());

    let ready = dom.body_ready()?;

    // Simulate the parser finishing on another task
    let document = dom.document().clone();
    let parser = tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        document.finish_loading()
    });

    let Some(body) = ready.await else {
        println!("Document went away before its body was parsed");
        return Ok(());
    };
    parser.await??;

    // Build a small banner
    let banner = dom.create_element("div")?;
    dom.style(banner, "padding: 8px; background: #fffbe6")?;
    dom.add_class(banner, "banner")?;
    dom.add_class(banner, "visible")?;
    dom.append(banner, dom.create_text("Body is ready"))?;
    dom.append(body, banner)?;

    dom.add_listener(banner, "click", |event: &Event| {
        println!("Clicked: {:?}", event.target());
    })?;
    dom.document().dispatch_event(banner, Event::new("click"))?;

    dom.replace_class(banner, "visible", "dismissed")?;
    println!("{}", dom.document().outer_html(body)?);

    Ok(())
}
