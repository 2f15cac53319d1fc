//! Embedded spider catalog (spec.md §9: "spider registry built once at
//! startup from embedded JSON"). Real platform endpoints are intentionally
//! out of scope; these entries exercise the registry/dispatcher shape.
pub const EMBEDDED_CATALOG_JSON: &str = r#"
[
  {
    "id": "ba_salvador",
    "name": "Salvador",
    "territory_id": "2927408",
    "spider_type": "doem",
    "gazette_scope": "city",
    "base_url": "https://doem.org.br/ba/salvador/index.json"
  },
  {
    "id": "ba_feira_de_santana",
    "name": "Feira de Santana",
    "territory_id": "2910800",
    "spider_type": "doem",
    "gazette_scope": "city",
    "base_url": "https://doem.org.br/ba/feira-de-santana/index.json"
  },
  {
    "id": "ba_state",
    "name": "Bahia",
    "territory_id": "ba",
    "spider_type": "siganet",
    "gazette_scope": "state",
    "base_url": "https://diario.ba.gov.br/index.json",
    "member_territories": [
      {"territory_id": "2927408", "name": "Salvador"},
      {"territory_id": "2910800", "name": "Feira de Santana"},
      {"territory_id": "2933307", "name": "Vitória da Conquista"}
    ]
  },
  {
    "id": "sp_sao_paulo",
    "name": "São Paulo",
    "territory_id": "3550308",
    "spider_type": "dosp",
    "gazette_scope": "city",
    "base_url": "https://doweb.rio.rj.gov.br/sp/sao-paulo/index.json"
  }
]
"#;
