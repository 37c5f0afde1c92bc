use chrono::{TimeZone, Utc};
use radar_common::settings::ExtractSettings;
use radar_web::{image, meta, urls, BodyExtractor, ExtractedArticle};
use url::Url;

const TAX_ARTICLE: &str = r#"
<!doctype html>
<html lang="uk">
<head>
  <title>ДПС роз'яснює порядок сплати військового збору | ДПС України</title>
  <meta property="og:image" content="/data/material/000/945/preview1.jpg">
  <meta property="og:description" content="Податківці нагадали про ставку військового збору для ФОП.">
  <link rel="alternate" media="print" href="/media-tsentr/novini/print-945326.html">
</head>
<body>
  <header><nav><ul><li><a href="/">Головна</a></li><li><a href="/media-tsentr/">Медіа-центр</a></li></ul></nav></header>
  <main>
    <article>
      <div class="breadcrumbs">Головна / Новини</div>
      <h1>ДПС роз'яснює порядок сплати військового збору</h1>
      <div class="article__date">23.10.2025 14:13</div>
      <div class="article__content">
        <p><img src="/data/material/000/945/945326/big.jpg" alt=""></p>
        <p>Фізичні особи – підприємці першої, другої та четвертої груп сплачують військовий збір щомісяця
        у розмірі 10 відсотків мінімальної заробітної плати, встановленої на 1 січня податкового року.</p>
        <p>Платники третьої групи сплачують збір за ставкою 1 відсоток доходу.</p>
        <table>
          <tr><th>Група</th><th>Ставка</th></tr>
          <tr><td>1, 2, 4</td><td>10% МЗП</td></tr>
          <tr><td>3</td><td>1% доходу</td></tr>
        </table>
        <p>Детальніше про порядок сплати можна дізнатися в розділі «Податкові консультації».</p>
      </div>
      <div class="article__share">Поділитися: Facebook Telegram</div>
      <h3>Останні новини</h3>
      <ul><li>Інша новина про акциз</li></ul>
    </article>
  </main>
  <footer><p>© Державна податкова служба України</p></footer>
</body>
</html>
"#;

#[test]
fn full_tax_page() {
    let base = "https://tax.gov.ua/media-tsentr/novini/945326.html";
    let extractor = BodyExtractor::new(ExtractSettings::default());
    let article = ExtractedArticle::from_html(
        &extractor,
        TAX_ARTICLE,
        base,
        Some("ДПС роз'яснює порядок сплати військового збору"),
    );

    let body = article.body.expect("body");
    assert!(body.starts_with("Фізичні особи – підприємці"));
    assert!(body.contains("1, 2, 4 — 10% МЗП\n3 — 1% доходу"));
    assert!(body.ends_with("«Податкові консультації»."));
    assert!(!body.contains("Поділитися"));
    assert!(!body.contains("акциз"));
    assert!(!body.contains("Головна"));

    assert_eq!(
        article.image_url.as_deref(),
        Some("https://tax.gov.ua/data/material/000/945/945326/big.jpg")
    );
    assert_eq!(
        article.published_at,
        Some(Utc.with_ymd_and_hms(2025, 10, 23, 11, 13, 0).unwrap())
    );
}

#[test]
fn print_view_is_discovered_and_summary_available() {
    let article = Url::parse("https://tax.gov.ua/media-tsentr/novini/945326.html").unwrap();
    let print = urls::discover_tax_print_url(&article, Some(TAX_ARTICLE)).unwrap();
    assert_eq!(print.as_str(), "https://tax.gov.ua/media-tsentr/novini/print-945326.html");
    assert_eq!(
        meta::meta_description(TAX_ARTICLE).as_deref(),
        Some("Податківці нагадали про ставку військового збору для ФОП.")
    );
}

#[test]
fn print_page_preview_is_upgraded_from_content_images() {
    let print_html = r#"<html><body>
        <img src="/data/material/000/945/preview1.jpg">
        <p>Текст для друку</p></body></html>"#;
    let base = Some("https://tax.gov.ua/media-tsentr/novini/print-945326.html");
    let picked = image::resolve(print_html, base).unwrap();
    assert!(image::is_preview(&picked));

    let upgraded = image::full_image_in(
        TAX_ARTICLE,
        Some("https://tax.gov.ua/media-tsentr/novini/945326.html"),
        image::TAX_CONTENT_SELECTORS,
    );
    assert_eq!(
        upgraded.as_deref(),
        Some("https://tax.gov.ua/data/material/000/945/945326/big.jpg")
    );
}
